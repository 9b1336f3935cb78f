/// Order aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

/// Milestone regions
pub mod milestones;

/// Sleep schedule
pub mod sleep;

/// Missing-info overlay
pub mod missing_info;

/// Derived read predicates
pub mod predicates;

/// Input DTOs
pub mod inputs;

/// View (read model)
pub mod view;

/// Event dispatch port
pub mod dispatch;

/// Order number registry projection
pub mod registry;

/// CQRS setup
pub mod cqrs;

pub use aggregate::{Order, Services, AGGREGATE_TYPE};
pub use commands::Command;
pub use dispatch::{DispatchQuery, EventDispatcher};
pub use events::Event;
pub use milestones::{Milestone, MilestoneKind, MilestoneRegion, MilestoneStatus};
pub use missing_info::{MissingInfoState, MissingStatus};
pub use registry::RegistryQuery;
pub use sleep::{SleepSchedule, SleepState, SleepStatus};
pub use view::{Query, View};
