use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Generic success body returned by mutating endpoints that have nothing else to say.
#[derive(Serialize, Debug)]
pub struct Success {
    pub success: &'static str,
}

impl Success {
    pub fn ok() -> Self { Self { success: "OK" } }
}
