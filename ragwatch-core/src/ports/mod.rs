// ragwatch-core/src/ports/mod.rs
//
// Contracts the application needs, without knowing how they are fulfilled.

pub mod cancellation;
pub mod clock;
pub mod repository;
pub mod source;
pub mod transport;

pub use cancellation::{CancelHandle, Cancellation};
pub use clock::{Clock, FixedClock, SystemClock};
pub use repository::EntityRepository;
pub use source::{FetchContext, SourceStrategy, check_group};
pub use transport::{GraphQlRequest, GraphQlTransport, JobStatsApi, JobStatsQuery};
