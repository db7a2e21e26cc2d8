// Domain-layer modules and shared errors/models
pub mod forwarder {
    pub use crate::forwarder::*;
}

pub mod lead_models {
    pub use crate::lead_models::*;
}

pub mod subscriber_hash {
    pub use crate::subscriber_hash::*;
}

pub mod errors {
    pub use crate::errors::*;
}
