mod collar;
mod error;
mod local;

pub use collar::{Collar, CollarService, CollarState, Connector, Friends, Groups, Locations};
pub use local::{LocalCollar, LocalConnector};

pub use error::ServiceError;
