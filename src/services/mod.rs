// Services - reconciliation, optimistic stores and the controllers built on them

pub mod identity_switcher;
pub mod page_controller;
pub mod reconciliation_engine;
pub mod sub_resource_store;

pub use identity_switcher::{IdentitySwitcher, RosterEntry, RosterQuery, RosterSort, SwitcherState};
pub use page_controller::{EditOutcome, PageController, PageStores};
pub use reconciliation_engine::{MergedView, Reconciliation, ReconciliationEngine};
pub use sub_resource_store::{StoreEvent, SubResourceStore, TEMP_ID_PREFIX};
