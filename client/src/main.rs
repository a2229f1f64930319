//! Terminal front end for the family expense tracker.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use rust_decimal::Decimal;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use famspend::config::ClientSettings;
use famspend::domain::ports::{FamilyView, Notifier};
use famspend::domain::{
    ActionReporter, BackendProcedures, CategoryActions, CategoryId, CategoryName, CategoryStore,
    DashboardStore, DeleteConfirmation, ExpenseActions, ExpenseId, ExpensesDashboard, Family,
    FamilyActions, FamilyName, FamilyState, FamilyStore, FamilyUpdate, JoinCode, MemberAction,
    NewFamily, SessionResolver, SpendingLimit, UserId, manageable_members,
};
use famspend::format::{format_currency, format_date, format_time};
use famspend::outbound::notifier::TracingNotifier;
use famspend::outbound::supabase::SupabaseClient;

/// `famspend` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "famspend",
    about = "Manage your family, categories and expenses from the terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the signed-in user and their family membership.
    Whoami,
    /// Create, join and administer your family.
    #[command(subcommand)]
    Family(FamilyCommand),
    /// Manage your family's expense categories.
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Review and delete expenses.
    #[command(subcommand)]
    Expenses(ExpenseCommand),
    /// Sign out and discard the session.
    Logout,
}

#[derive(Debug, Subcommand)]
enum FamilyCommand {
    /// Show your family and its members.
    Show,
    /// Create a family with you as admin.
    Create {
        /// Family name.
        name: String,
        /// Optional monthly spending limit.
        #[arg(long, value_name = "amount")]
        limit: Option<Decimal>,
    },
    /// Join a family with its join code.
    Join {
        /// Join code shared by a member.
        code: String,
    },
    /// Leave your family.
    Leave,
    /// Rename your family.
    Rename {
        /// New family name.
        name: String,
    },
    /// Set or clear the monthly spending limit.
    Limit {
        /// New limit; omit to clear it.
        amount: Option<Decimal>,
    },
    /// Delete your family.
    Delete {
        /// The family name, typed exactly.
        #[arg(long, value_name = "name")]
        confirm: String,
    },
    /// Issue a new join code.
    RegenerateCode,
    /// Make a member an admin.
    Promote {
        /// Member's user id.
        user_id: UserId,
    },
    /// Make an admin a regular member.
    Demote {
        /// Member's user id.
        user_id: UserId,
    },
    /// Remove a member from the family.
    Kick {
        /// Member's user id.
        user_id: UserId,
    },
}

#[derive(Debug, Subcommand)]
enum CategoryCommand {
    /// List categories.
    List,
    /// Add a category.
    Add {
        /// Category name.
        name: String,
    },
    /// Remove a category.
    Remove {
        /// Category id.
        category_id: CategoryId,
    },
}

#[derive(Debug, Subcommand)]
enum ExpenseCommand {
    /// Show totals, recent family expenses and your own expenses.
    Dashboard,
    /// Delete one of your expenses.
    Delete {
        /// Expense id.
        expense_id: ExpenseId,
    },
}

/// Prints notifications to stderr and forwards them to the log.
struct TerminalNotifier(TracingNotifier);

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        self.0.success(message);
        eprintln!("ok: {message}");
    }

    fn failure(&self, message: &str) {
        self.0.failure(message);
        eprintln!("error: {message}");
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let settings = ClientSettings::load_from_iter([OsString::from("famspend")])
        .wrap_err("failed to load famspend settings")?;
    init_tracing(settings.log_json());

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(cli.command, settings))
}

fn init_tracing(json: bool) {
    let builder = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

async fn run(command: Command, settings: ClientSettings) -> Result<()> {
    let config = settings
        .supabase_config()
        .wrap_err("invalid backend settings")?;
    let client =
        Arc::new(SupabaseClient::new(config).wrap_err("failed to build the HTTP client")?);
    if let Some(tokens) = settings.session_tokens() {
        client.set_session(tokens).await;
    } else if let Some((email, password)) = settings.credentials() {
        client
            .sign_in_with_password(email, password.as_str())
            .await
            .wrap_err("sign-in failed")?;
    }

    let app = App::new(Arc::clone(&client));
    let outcome = app.execute(command).await;
    app.dispose();
    client.dispose().await;
    outcome
}

struct App {
    client: Arc<SupabaseClient>,
    procedures: BackendProcedures,
    session: Arc<SessionResolver>,
    family: Arc<FamilyStore>,
    notifier: Arc<dyn Notifier>,
}

impl App {
    fn new(client: Arc<SupabaseClient>) -> Self {
        let procedures = BackendProcedures::new(client.clone());
        let session = Arc::new(SessionResolver::new(client.clone(), procedures.clone()));
        let family = Arc::new(FamilyStore::new(Arc::clone(&session), procedures.clone()));
        Self {
            client,
            procedures,
            session,
            family,
            notifier: Arc::new(TerminalNotifier(TracingNotifier)),
        }
    }

    fn dispose(&self) {
        self.family.dispose();
        self.session.dispose();
    }

    fn family_actions(&self) -> FamilyActions {
        let view: Arc<dyn FamilyView> = self.family.clone();
        FamilyActions::new(self.procedures.clone(), view, Arc::clone(&self.notifier))
    }

    async fn load_family(&self) -> FamilyState {
        self.session.refresh().await;
        self.family.load().await;
        self.family.snapshot()
    }

    async fn require_family(&self) -> Result<(FamilyState, Family)> {
        let state = self.load_family().await;
        let family = state
            .family
            .clone()
            .ok_or_else(|| eyre!("you are not in a family; create or join one first"))?;
        Ok((state, family))
    }

    async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Whoami => self.whoami().await,
            Command::Family(command) => self.family(command).await,
            Command::Categories(command) => self.categories(command).await,
            Command::Expenses(command) => self.expenses(command).await,
            Command::Logout => {
                self.client.sign_out().await.wrap_err("sign-out failed")?;
                println!("Signed out.");
                Ok(())
            }
        }
    }

    async fn whoami(&self) -> Result<()> {
        self.session.refresh().await;
        let state = self.session.snapshot();
        let Some(identity) = state.identity else {
            println!("Not signed in.");
            return Ok(());
        };
        println!("user: {} ({})", identity.username(), identity.id());
        if let Some(email) = identity.email() {
            println!("email: {email}");
        }
        match state.context.as_ref().and_then(|context| context.membership()) {
            Some(membership) => println!(
                "family: {} ({})",
                membership.family_name(),
                membership.role()
            ),
            None => print_no_family(),
        }
        Ok(())
    }

    async fn family(&self, command: FamilyCommand) -> Result<()> {
        let actions = self.family_actions();
        match command {
            FamilyCommand::Show => {
                let state = self.load_family().await;
                print_family(&state);
            }
            FamilyCommand::Create { name, limit } => {
                let new_family = NewFamily {
                    name: FamilyName::new(&name).wrap_err("invalid family name")?,
                    monthly_spending_limit: limit
                        .map(SpendingLimit::new)
                        .transpose()
                        .wrap_err("invalid spending limit")?,
                };
                actions.create_family(&new_family).await?;
            }
            FamilyCommand::Join { code } => {
                let code = JoinCode::new(&code).wrap_err("invalid join code")?;
                actions.join_family(&code).await?;
            }
            FamilyCommand::Leave => actions.leave_family().await?,
            FamilyCommand::Rename { name } => {
                let (_, family) = self.require_family().await?;
                let update = FamilyUpdate {
                    name: Some(FamilyName::new(&name).wrap_err("invalid family name")?),
                    monthly_spending_limit: current_limit(&family)?,
                };
                actions.update_family(&update).await?;
            }
            FamilyCommand::Limit { amount } => {
                let (_, family) = self.require_family().await?;
                let update = FamilyUpdate {
                    name: Some(FamilyName::new(&family.name).wrap_err("invalid family name")?),
                    monthly_spending_limit: amount
                        .map(SpendingLimit::new)
                        .transpose()
                        .wrap_err("invalid spending limit")?,
                };
                actions.update_family(&update).await?;
            }
            FamilyCommand::Delete { confirm } => {
                let (_, family) = self.require_family().await?;
                DeleteConfirmation::verify(&family, &confirm)
                    .wrap_err("refusing to delete the family")?;
                actions.delete_family().await?;
            }
            FamilyCommand::RegenerateCode => {
                self.load_family().await;
                let code = actions.regenerate_join_code().await?;
                println!("join code: {code}");
            }
            FamilyCommand::Promote { user_id } => {
                self.manage_member(&actions, &user_id, MemberAction::Promote).await?;
            }
            FamilyCommand::Demote { user_id } => {
                self.manage_member(&actions, &user_id, MemberAction::Demote).await?;
            }
            FamilyCommand::Kick { user_id } => {
                self.manage_member(&actions, &user_id, MemberAction::Kick).await?;
            }
        }
        Ok(())
    }

    async fn manage_member(
        &self,
        actions: &FamilyActions,
        target: &UserId,
        action: MemberAction,
    ) -> Result<()> {
        let (state, _) = self.require_family().await?;
        let me = self
            .session
            .snapshot()
            .identity
            .map(|identity| identity.id().clone())
            .ok_or_else(|| eyre!("not signed in"))?;
        let member = manageable_members(&state.members, &me)
            .find(|member| &member.user_id == target)
            .ok_or_else(|| eyre!("{target} is not a member you can manage"))?;
        if !MemberAction::available_for(member).contains(&action) {
            return Err(eyre!(
                "{} is already {}",
                member.profile.username,
                member.role
            ));
        }
        match action.target_role() {
            Some(role) => actions.change_member_role(target, role).await?,
            None => actions.kick_member(target).await?,
        }
        Ok(())
    }

    async fn categories(&self, command: CategoryCommand) -> Result<()> {
        let store = Arc::new(CategoryStore::new(
            self.procedures.clone(),
            Arc::clone(&self.notifier),
        ));
        let reporter = ActionReporter::new(Arc::clone(&self.notifier)).with_on_success(store.clone());
        let actions = CategoryActions::new(self.procedures.clone(), reporter);
        match command {
            CategoryCommand::List => {
                store.load().await;
                let state = store.snapshot();
                if state.error.is_some() {
                    return Err(eyre!("could not load categories"));
                }
                if state.categories.is_empty() {
                    println!("No categories yet.");
                }
                for category in &state.categories {
                    println!(
                        "{}  {}  (added {})",
                        category.id,
                        category.name,
                        format_date(category.created_at)
                    );
                }
            }
            CategoryCommand::Add { name } => {
                let name = CategoryName::new(&name).wrap_err("invalid category name")?;
                actions.create(&name).await?;
            }
            CategoryCommand::Remove { category_id } => actions.remove(&category_id).await?,
        }
        store.dispose();
        Ok(())
    }

    async fn expenses(&self, command: ExpenseCommand) -> Result<()> {
        let store = Arc::new(DashboardStore::new(self.procedures.clone()));
        match command {
            ExpenseCommand::Dashboard => {
                store.load().await;
                let state = store.snapshot();
                if let Some(error) = state.error {
                    return Err(eyre!(error).wrap_err("could not load the expenses dashboard"));
                }
                if let Some(dashboard) = state.data {
                    print_dashboard(&dashboard);
                }
            }
            ExpenseCommand::Delete { expense_id } => {
                let reporter =
                    ActionReporter::new(Arc::clone(&self.notifier)).with_on_success(store.clone());
                ExpenseActions::new(self.procedures.clone(), reporter)
                    .delete_expense(&expense_id)
                    .await?;
            }
        }
        store.dispose();
        Ok(())
    }
}

fn current_limit(family: &Family) -> Result<Option<SpendingLimit>> {
    family
        .monthly_spending_limit
        .map(SpendingLimit::new)
        .transpose()
        .wrap_err("the current spending limit is invalid")
}

fn print_no_family() {
    println!("You are not in a family yet.");
    println!("Create one with `famspend family create <name>` or join with `famspend family join <code>`.");
}

fn print_family(state: &FamilyState) {
    let Some(family) = &state.family else {
        print_no_family();
        return;
    };
    println!("family: {}", family.name);
    if let Some(code) = &family.join_code {
        println!("join code: {code}");
    }
    match family.monthly_spending_limit {
        Some(limit) => println!("monthly limit: {}", format_currency(Some(limit))),
        None => println!("monthly limit: none"),
    }
    if state.is_admin {
        println!("you are an admin");
    }
    if let Some(error) = &state.error {
        println!("members unavailable: {error}");
        return;
    }
    println!("members:");
    for member in &state.members {
        println!(
            "  {}  {:<20} {:<6} joined {}",
            member.user_id,
            member.profile.username,
            member.role,
            format_date(member.joined_at)
        );
    }
}

fn print_dashboard(dashboard: &ExpensesDashboard) {
    match &dashboard.family {
        Some(family) => println!("family: {}", family.name),
        None => print_no_family(),
    }
    println!("your spend:   {}", format_currency(Some(dashboard.personal_total)));
    println!("family spend: {}", format_currency(Some(dashboard.family_total)));
    if let Some(limit) = dashboard
        .family
        .as_ref()
        .and_then(|family| family.monthly_spending_limit)
    {
        println!("monthly limit: {}", format_currency(Some(limit)));
    }

    println!("recent family expenses:");
    for expense in &dashboard.recent_family_expenses {
        println!(
            "  {:<24} {:>16}  by {}",
            expense.expense_title,
            format_currency(Some(expense.amount)),
            expense.username
        );
    }

    println!("your expenses:");
    for expense in &dashboard.personal_expenses {
        println!(
            "  {}  {} {}  {:<24} {:>16}  {}",
            expense.id,
            format_date(expense.created_at),
            format_time(expense.created_at),
            expense.expense_title,
            format_currency(Some(expense.amount)),
            expense.payment_method.as_deref().unwrap_or("")
        );
    }
}
