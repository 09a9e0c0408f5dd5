//! Collaborators queried by the graph builder: function definitions, the
//! resolver that picks them, target lookup and live-data availability.
pub mod declared;
pub mod definition;
pub mod live_data;
pub mod resolver;
pub mod target;

pub use declared::{DeclaredFunction, InputDeclaration, InputTarget};
pub use definition::{FunctionDefinition, FunctionRef, LiveDataSourcingFunction};
pub use live_data::{FixedLiveDataAvailabilityProvider, LiveDataAvailabilityProvider};
pub use resolver::{DefaultFunctionResolver, FunctionRepository, FunctionResolver, ResolutionContext};
pub use target::{MapTargetResolver, TargetResolver};
