//! Finance CLI
//!
//! Command-line interface to a running `finance-api` server:
//! - Show the dashboard, accounts, transactions, cards and profile
//! - Add, edit and delete accounts and transactions
//! - Validate credit card payments
//! - Check status and generate a config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use finance_tracker::analytics::format_money;
use finance_tracker::config::Config;

#[derive(Parser)]
#[command(name = "finance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Personal finance tracker")]
#[command(long_about = "Track accounts, credit cards, income and expenses.\nTalks to a running finance-api server.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8085", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show totals, spending and recent transactions
    Dashboard,

    /// List accounts grouped by type
    Accounts,

    /// Add, edit or delete an account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// List transactions
    Transactions {
        /// Type filter (all, income, expense)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// Description search
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Add, edit or delete a transaction
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },

    /// Show credit card overview
    Cards,

    /// Show or pay a credit card
    Card {
        #[command(subcommand)]
        action: CardAction,
    },

    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show system status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AccountAction {
    /// Add an account
    Add {
        name: String,
        /// cash, bank, wallet or credit
        #[arg(short = 't', long = "type")]
        kind: String,
        #[arg(short, long, default_value = "0")]
        balance: String,
        /// Credit limit (credit cards)
        #[arg(long)]
        limit: Option<String>,
        /// Statement date YYYY-MM-DD (credit cards)
        #[arg(long)]
        statement_date: Option<String>,
        /// Payment due date YYYY-MM-DD (credit cards)
        #[arg(long)]
        due_date: Option<String>,
    },
    /// Edit an account; unset options keep their current value
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        #[arg(short, long)]
        balance: Option<String>,
        #[arg(long)]
        limit: Option<String>,
        #[arg(long)]
        statement_date: Option<String>,
        #[arg(long)]
        due_date: Option<String>,
    },
    /// Delete an account
    Delete { id: Uuid },
}

#[derive(Subcommand)]
pub enum TxAction {
    /// Add a transaction
    Add {
        amount: String,
        /// Category name or id
        #[arg(short, long)]
        category: String,
        /// Account name or id
        #[arg(short, long)]
        account: String,
        #[arg(short, long)]
        description: Option<String>,
        /// income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,
    },
    /// Edit a transaction; unset options keep their current value
    Edit {
        id: Uuid,
        #[arg(long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        account: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a transaction
    Delete { id: Uuid },
}

#[derive(Subcommand)]
pub enum CardAction {
    /// Show card details
    Show { id: Uuid },
    /// Validate a payment toward the card balance
    Pay {
        id: Uuid,
        /// Account name or id to pay from
        #[arg(long)]
        from: String,
        /// Amount (default: full balance)
        #[arg(long)]
        amount: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the profile
    Show,
    /// Edit the profile; unset options keep their current value
    Edit {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
}

/// Thin JSON client for the finance API
struct ApiClient {
    http: reqwest::Client,
    base: String,
    assume_yes: bool,
}

impl ApiClient {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base.trim_end_matches('/'), path)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> anyhow::Result<reqwest::Response> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .with_context(|| format!("Cannot connect to finance API at {}", self.base))
    }

    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let response = self.send(Method::GET, path, None).await?;
        read_json(response).await
    }

    async fn call(&self, method: Method, path: &str, body: &Value) -> anyhow::Result<Value> {
        let response = self.send(method, path, Some(body)).await?;
        read_json(response).await
    }

    /// Submit an edit or delete, asking first when the server wants confirmation
    ///
    /// Returns `None` when the user declines.
    async fn gated(&self, method: Method, path: &str, body: Option<&Value>) -> anyhow::Result<Option<Value>> {
        let confirmed = format!("{}?confirm=true", path);

        if self.assume_yes {
            let response = self.send(method, &confirmed, body).await?;
            return read_json(response).await.map(Some);
        }

        let response = self.send(method.clone(), path, body).await?;
        if response.status() != StatusCode::PRECONDITION_REQUIRED {
            return read_json(response).await.map(Some);
        }

        let prompt: Value = response.json().await?;
        let confirmation = &prompt["error"]["confirmation"];
        println!("{}", confirmation["description"].as_str().unwrap_or_default());
        if !ask(confirmation["title"].as_str().unwrap_or("Continue?"))? {
            println!("Cancelled.");
            return Ok(None);
        }

        let response = self.send(method, &confirmed, body).await?;
        read_json(response).await.map(Some)
    }
}

async fn read_json(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        return Ok(body);
    }

    let error = &body["error"];
    let message = error["message"].as_str().unwrap_or("Request failed");
    match error["title"].as_str() {
        Some(title) => bail!("{}: {}", title, message),
        None => bail!("{} ({})", message, status),
    }
}

fn ask(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let currency = Config::load_default().display.currency;
    let client = ApiClient {
        http: reqwest::Client::new(),
        base: cli.api_url.clone(),
        assume_yes: cli.yes,
    };
    let out = Output {
        json: cli.format == "json",
        currency,
    };

    match cli.command {
        Commands::Dashboard => out.dashboard(&client.get("/dashboard").await?)?,

        Commands::Accounts => out.accounts(&client.get("/accounts").await?)?,

        Commands::Account { action } => match action {
            AccountAction::Add {
                name,
                kind,
                balance,
                limit,
                statement_date,
                due_date,
            } => {
                let body = json!({
                    "name": name,
                    "type": kind,
                    "balance": balance,
                    "credit_limit": limit.unwrap_or_default(),
                    "statement_date": statement_date.unwrap_or_default(),
                    "payment_due_date": due_date.unwrap_or_default(),
                });
                let account = client.call(Method::POST, "/accounts", &body).await?;
                println!("Account Added: {} added successfully", text(&account["name"]));
            }
            AccountAction::Edit {
                id,
                name,
                kind,
                balance,
                limit,
                statement_date,
                due_date,
            } => {
                let path = format!("/accounts/{}", id);
                let current = client.get(&path).await?;
                let body = json!({
                    "name": name.unwrap_or_else(|| text(&current["name"])),
                    "type": kind.unwrap_or_else(|| text(&current["type"])),
                    "balance": balance.unwrap_or_else(|| plain(&current["balance"])),
                    "credit_limit": limit.unwrap_or_else(|| plain(&current["credit_limit"])),
                    "statement_date": statement_date.unwrap_or_else(|| text(&current["statement_date"])),
                    "payment_due_date": due_date.unwrap_or_else(|| text(&current["payment_due_date"])),
                });
                if let Some(account) = client.gated(Method::PUT, &path, Some(&body)).await? {
                    println!("Account Updated: {} updated successfully", text(&account["name"]));
                }
            }
            AccountAction::Delete { id } => {
                let path = format!("/accounts/{}", id);
                if client.gated(Method::DELETE, &path, None).await?.is_some() {
                    println!("Account Deleted: Account has been removed successfully");
                }
            }
        },

        Commands::Transactions { kind, search } => {
            let mut query = Vec::new();
            if let Some(kind) = kind {
                query.push(format!("type={}", urlencoding::encode(&kind)));
            }
            if let Some(search) = search {
                query.push(format!("search={}", urlencoding::encode(&search)));
            }
            let path = if query.is_empty() {
                "/transactions".to_string()
            } else {
                format!("/transactions?{}", query.join("&"))
            };
            out.transactions(&client.get(&path).await?)?;
        }

        Commands::Tx { action } => match action {
            TxAction::Add {
                amount,
                category,
                account,
                description,
                kind,
            } => {
                let category_id = resolve_category(&client, &category, Some(&kind)).await?;
                let account_id = resolve_account(&client, &account).await?;
                let body = json!({
                    "amount": amount,
                    "type": kind,
                    "category_id": category_id,
                    "account_id": account_id,
                    "description": description.unwrap_or_default(),
                });
                let tx = client.call(Method::POST, "/transactions", &body).await?;
                println!("Transaction Added: {} added successfully", label(&tx["type"]));
            }
            TxAction::Edit {
                id,
                amount,
                category,
                account,
                description,
            } => {
                let path = format!("/transactions/{}", id);
                let current = client.get(&path).await?;
                let kind = text(&current["type"]);

                let category_id = match category {
                    Some(category) => resolve_category(&client, &category, Some(&kind)).await?,
                    None => text(&current["category_id"]),
                };
                let account_id = match account {
                    Some(account) => resolve_account(&client, &account).await?,
                    None => text(&current["account_id"]),
                };
                let body = json!({
                    "amount": amount.unwrap_or_else(|| plain(&current["amount"])),
                    "category_id": category_id,
                    "account_id": account_id,
                    "description": description.unwrap_or_else(|| text(&current["description"])),
                });
                if let Some(tx) = client.gated(Method::PUT, &path, Some(&body)).await? {
                    println!("Transaction Updated: {} updated successfully", label(&tx["type"]));
                }
            }
            TxAction::Delete { id } => {
                let path = format!("/transactions/{}", id);
                if client.gated(Method::DELETE, &path, None).await?.is_some() {
                    println!("Transaction Deleted: Transaction has been removed successfully");
                }
            }
        },

        Commands::Cards => out.cards(&client.get("/cards").await?)?,

        Commands::Card { action } => match action {
            CardAction::Show { id } => out.card(&client.get(&format!("/cards/{}", id)).await?)?,
            CardAction::Pay { id, from, amount } => {
                let from_account_id = resolve_account(&client, &from).await?;
                let body = json!({
                    "from_account_id": from_account_id,
                    "amount": amount.unwrap_or_default(),
                });
                let intent = client
                    .call(Method::POST, &format!("/cards/{}/pay", id), &body)
                    .await?;
                if out.json {
                    println!("{}", serde_json::to_string_pretty(&intent)?);
                } else {
                    println!(
                        "Payment of {} accepted (no funds were moved)",
                        out.money(&intent["amount"])
                    );
                }
            }
        },

        Commands::Profile { action } => match action {
            ProfileAction::Show => out.profile(&client.get("/profile").await?)?,
            ProfileAction::Edit {
                first_name,
                last_name,
                phone,
                address,
            } => {
                let current = client.get("/profile").await?;
                let profile = &current["profile"];
                let body = json!({
                    "first_name": first_name.unwrap_or_else(|| text(&profile["first_name"])),
                    "last_name": last_name.unwrap_or_else(|| text(&profile["last_name"])),
                    "phone": phone.unwrap_or_else(|| text(&profile["phone"])),
                    "address": address.unwrap_or_else(|| text(&profile["address"])),
                });
                client.call(Method::PUT, "/profile", &body).await?;
                println!("Profile Updated: Your profile has been updated successfully");
            }
        },

        Commands::Status => {
            let response = client
                .http
                .get(format!("{}/health", cli.api_url.trim_end_matches('/')))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    println!("Finance Tracker v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!(
                        "Backend: {} ({})",
                        health["backend_kind"].as_str().unwrap_or("unknown"),
                        health["backend"].as_str().unwrap_or("unknown")
                    );
                    println!(
                        "Signed in: {}",
                        if health["signed_in"].as_bool().unwrap_or(false) { "yes" } else { "no" }
                    );
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => bail!("API returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to finance API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the API server is running:");
                    eprintln!("  cargo run --bin finance-api");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = finance_tracker::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", config),
            }
        }
    }

    Ok(())
}

/// Find a category id by id or case-insensitive name
async fn resolve_category(client: &ApiClient, key: &str, kind: Option<&str>) -> anyhow::Result<String> {
    if Uuid::parse_str(key).is_ok() {
        return Ok(key.to_string());
    }
    let path = match kind {
        Some(kind) => format!("/categories?type={}", urlencoding::encode(kind)),
        None => "/categories".to_string(),
    };
    let list = client.get(&path).await?;
    find_by_name(list["categories"].as_array(), key)
        .with_context(|| format!("No category named {:?}", key))
}

/// Find an account id by id or case-insensitive name
async fn resolve_account(client: &ApiClient, key: &str) -> anyhow::Result<String> {
    if Uuid::parse_str(key).is_ok() {
        return Ok(key.to_string());
    }
    let view = client.get("/accounts").await?;
    let all: Vec<Value> = ["cash_and_bank", "wallets", "credit_cards"]
        .iter()
        .filter_map(|group| view[*group].as_array())
        .flatten()
        .cloned()
        .collect();
    find_by_name(Some(&all), key).with_context(|| format!("No account named {:?}", key))
}

fn find_by_name(items: Option<&Vec<Value>>, name: &str) -> Option<String> {
    items?
        .iter()
        .find(|item| text(&item["name"]).eq_ignore_ascii_case(name))
        .map(|item| text(&item["id"]))
}

/// A JSON string, or empty
fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

/// A JSON number as plain input text, or empty
fn plain(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

fn label(kind: &Value) -> &'static str {
    match kind.as_str() {
        Some("income") => "Income",
        _ => "Expense",
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

/// Table or JSON rendering of API responses
struct Output {
    json: bool,
    currency: String,
}

impl Output {
    fn money(&self, value: &Value) -> String {
        let amount = value
            .as_f64()
            .and_then(|f| Decimal::try_from(f).ok())
            .unwrap_or_default();
        format_money(amount.round_dp(2), &self.currency)
    }

    fn raw(&self, value: &Value) -> anyhow::Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(self.json)
    }

    fn dashboard(&self, view: &Value) -> anyhow::Result<()> {
        if self.raw(view)? {
            return Ok(());
        }

        let totals = &view["totals"];
        println!("Total Balance:  {}", text(&view["balance_display"]));
        println!("Total Income:   {}", self.money(&totals["total_income"]));
        println!("Total Expenses: {}", self.money(&totals["total_expenses"]));

        println!();
        println!("Spending by Category");
        println!("{}", "-".repeat(44));
        match view["spending"]["slices"].as_array() {
            Some(slices) if !slices.is_empty() => {
                for slice in slices {
                    println!(
                        "{:<24} {:>12} {:>5.1}%",
                        text(&slice["name"]),
                        self.money(&slice["value"]),
                        slice["percent"].as_f64().unwrap_or(0.0)
                    );
                }
            }
            _ => println!("No expense data available"),
        }

        println!();
        println!("Monthly Overview");
        println!("{}", "-".repeat(44));
        for bucket in view["monthly"].as_array().into_iter().flatten() {
            println!(
                "{:<10} income {:>14}  expenses {:>14}",
                text(&bucket["label"]),
                self.money(&bucket["income"]),
                self.money(&bucket["expenses"])
            );
        }

        println!();
        println!("Recent Transactions");
        self.rows(&view["recent"]);
        Ok(())
    }

    fn accounts(&self, view: &Value) -> anyhow::Result<()> {
        if self.raw(view)? {
            return Ok(());
        }

        for (title, group) in [
            ("Cash & Bank", "cash_and_bank"),
            ("E-Wallets", "wallets"),
            ("Credit Cards", "credit_cards"),
        ] {
            println!("{}", title);
            let accounts = view[group].as_array().cloned().unwrap_or_default();
            if accounts.is_empty() {
                println!("  (none)");
            }
            for account in accounts {
                println!(
                    "  {:<24} {:>14}  {}",
                    text(&account["name"]),
                    self.money(&account["balance"]),
                    text(&account["id"])
                );
            }
            println!();
        }
        println!("Total Balance: {}", self.money(&view["total_balance"]));
        Ok(())
    }

    fn transactions(&self, view: &Value) -> anyhow::Result<()> {
        if self.raw(view)? {
            return Ok(());
        }

        println!(
            "Income {}   Expenses {}",
            self.money(&view["total_income"]),
            self.money(&view["total_expenses"])
        );
        println!();
        self.rows(&view["rows"]);
        Ok(())
    }

    fn rows(&self, rows: &Value) {
        let rows = rows.as_array().cloned().unwrap_or_default();
        if rows.is_empty() {
            println!("No transactions found");
            return;
        }

        println!(
            "{:<8} {:<18} {:<16} {:<24} {:>14}",
            "Date", "Category", "Account", "Description", "Amount"
        );
        println!("{}", "-".repeat(84));
        for row in rows {
            println!(
                "{:<8} {:<18} {:<16} {:<24} {:>14}",
                text(&row["display_date"]),
                text(&row["category_name"]),
                text(&row["account_name"]),
                text(&row["description"]),
                text(&row["display_amount"])
            );
        }
    }

    fn cards(&self, view: &Value) -> anyhow::Result<()> {
        if self.raw(view)? {
            return Ok(());
        }

        let portfolio = &view["portfolio"];
        println!("Total Debt:      {}", self.money(&portfolio["total_debt"]));
        println!("Total Limit:     {}", self.money(&portfolio["total_limit"]));
        println!("Total Available: {}", self.money(&portfolio["total_available"]));
        let near = portfolio["near_limit_count"].as_u64().unwrap_or(0);
        if near > 0 {
            println!("{} card(s) near limit", near);
        }

        println!();
        let cards = portfolio["cards"].as_array().cloned().unwrap_or_default();
        if cards.is_empty() {
            println!("No credit cards yet");
        }
        for stats in cards {
            self.card_line(&stats);
        }
        Ok(())
    }

    fn card_line(&self, stats: &Value) {
        let card = &stats["card"];
        println!(
            "{:<20} {}  {:>12} used  {:>5.1}%{}",
            text(&card["name"]),
            text(&stats["masked_number"]),
            self.money(&card["balance"]),
            stats["usage_percent"].as_f64().unwrap_or(0.0),
            if stats["near_limit"].as_bool().unwrap_or(false) { "  (near limit)" } else { "" }
        );
    }

    fn card(&self, details: &Value) -> anyhow::Result<()> {
        if self.raw(details)? {
            return Ok(());
        }

        self.card_line(&details["stats"]);
        println!();
        println!("Balance:        {}", self.money(&details["balance"]));
        println!("Credit Limit:   {}", self.money(&details["credit_limit"]));
        println!("Available:      {}", self.money(&details["available"]));
        println!("Statement Date: {}", text(&details["statement_date"]));
        println!("Payment Due:    {}", text(&details["payment_due_date"]));
        println!();
        println!("Recent Transactions");
        for tx in details["stats"]["recent"].as_array().into_iter().flatten() {
            println!(
                "  {:<28} {}{}",
                text(&tx["description"]),
                if tx["type"] == "income" { "+" } else { "-" },
                self.money(&tx["amount"])
            );
        }
        Ok(())
    }

    fn profile(&self, view: &Value) -> anyhow::Result<()> {
        if self.raw(view)? {
            return Ok(());
        }

        let stats = &view["stats"];
        let profile = &view["profile"];
        println!("[{}] {}", text(&stats["initials"]), text(&stats["full_name"]));
        println!("Email:   {}", text(&stats["email"]));
        println!("Phone:   {}", text(&profile["phone"]));
        println!("Address: {}", text(&profile["address"]));
        println!();
        println!("Accounts:     {}", stats["account_count"].as_u64().unwrap_or(0));
        println!("Transactions: {}", stats["transaction_count"].as_u64().unwrap_or(0));
        Ok(())
    }
}
