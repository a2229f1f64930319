//! Domain model, ports and services for the family expense client.
//!
//! Read models (session, family, categories, dashboard) are replaced
//! wholesale on every load. Dispatchers never patch them; a successful
//! mutation triggers a refetch instead.

mod category;
mod category_service;
mod context;
mod dispatch;
mod error;
mod expense;
mod expense_service;
mod family;
mod family_actions;
mod family_service;
mod identity;
mod ids;
mod in_flight;
mod lifecycle;
pub mod ports;
mod procedures;
mod session_service;
#[cfg(test)]
mod test_fixtures;

pub use self::category::{Category, CategoryName, CategoryValidationError};
pub use self::category_service::{CategoriesState, CategoryActions, CategoryStore};
pub use self::context::{ContextValidationError, Membership, UserContext};
pub use self::dispatch::ActionReporter;
pub use self::error::ActionError;
pub use self::expense::{ExpensesDashboard, PersonalExpense, RecentExpense};
pub use self::expense_service::{DashboardState, DashboardStore, ExpenseActions};
pub use self::family::{
    DeleteConfirmation, Family, FamilyMember, FamilyName, FamilyRole, FamilyUpdate,
    FamilyValidationError, JoinCode, MemberAction, MemberProfile, NAME_MAX, NewFamily,
    SpendingLimit, manageable_members,
};
pub use self::family_actions::FamilyActions;
pub use self::family_service::{FamilyState, FamilyStore, MembersState};
pub use self::identity::Identity;
pub use self::ids::{CategoryId, ExpenseId, FamilyId, IdParseError, UserId};
pub use self::in_flight::{InFlight, InFlightGuard};
pub use self::lifecycle::{Lifecycle, LoadTicket};
pub use self::procedures::BackendProcedures;
pub use self::session_service::{SessionResolver, SessionState};
