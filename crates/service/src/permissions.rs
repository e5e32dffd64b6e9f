//! Who may do what with notes.

use models::User;

use crate::errors::ServiceError;
use crate::settings::NotesSettings;

/// Listing and creating notes is reserved to staff.
pub fn can_manage_user_notes(user: &User) -> bool {
    user.is_staff()
}

/// Admins always; moderators only when the site allows it.
pub fn can_delete_user_notes(user: &User, settings: &NotesSettings) -> bool {
    user.admin || (settings.moderators_delete && user.is_staff())
}

pub fn ensure_can_delete(user: &User, settings: &NotesSettings) -> Result<(), ServiceError> {
    if can_delete_user_notes(user, settings) {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied("cannot delete user notes".into()))
    }
}
