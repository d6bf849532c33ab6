//! Action registry
//!
//! Collects `name -> ActionSpec` declarations for one controller. This is the
//! plain-data replacement for decorating controller methods: registering an
//! action is just inserting an entry, and the pipeline compiler consumes the
//! whole map later.

pub mod model;
pub mod registry;

pub use model::ActionSpec;
pub use registry::ActionRegistry;
