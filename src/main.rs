#![allow(clippy::result_large_err)]

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use portal_hub::{
    auth::{Session, StoredCredentials},
    config::{Settings, database, seed},
    core::{
        company::{self, NewAccount, NewCompany},
        product::{self, NewProduct},
        query::{
            CATALOG_PAGE_SIZE, Period, PriceRange, ProductCriteria, RECENT_TRANSACTIONS_LIMIT,
            TOP_COMPANIES_LIMIT, TRANSACTIONS_PAGE_SIZE, TransactionCriteria, filter_by_approval,
            filter_products, filter_transactions, paginate, recent_transactions,
            transactions_for_company, top_by_activity,
        },
        report::{self, TransactionView},
        transaction,
    },
    errors::{Error, Result},
    models::TransactionStatus,
    storage::{Snapshot, SqliteStorage},
};

/// Command line front end for the Portal HUB marketplace store
#[derive(Debug, Parser)]
#[command(name = "portal-hub", version, about)]
struct Cli {
    /// Login email for commands that need a session
    #[arg(long, global = true, env = "PORTAL_HUB_ADMIN_EMAIL")]
    email: Option<String>,

    /// Login password for commands that need a session
    #[arg(long, global = true, env = "PORTAL_HUB_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Platform totals (administrator)
    Stats,
    /// Dashboard numbers and recent activity
    Dashboard,
    /// Approved companies ranked by sales
    TopCompanies {
        #[arg(long, default_value_t = TOP_COMPANIES_LIMIT)]
        limit: usize,
    },
    /// Browse the approved catalog
    Catalog {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Price range such as `100-500` or `1000-`
        #[arg(long)]
        price: Option<PriceRange>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// The logged-in company's transaction history
    History {
        /// `pending`, `completed` or `cancelled`
        #[arg(long)]
        status: Option<String>,
        /// `today`, `week`, `month` or `year`
        #[arg(long)]
        period: Option<Period>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Buy an approved product for the logged-in company
    Buy { product_id: String },
    /// Plain-text receipt for one of the logged-in company's transactions
    Receipt { id: String },
    /// Sign up a company together with its login account
    Register {
        #[command(flatten)]
        company: CompanyArgs,
        #[arg(long)]
        account_password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Register a company for approval without a login account
    RegisterCompany {
        #[command(flatten)]
        company: CompanyArgs,
    },
    /// List a product for the logged-in company, pending approval
    AddProduct {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated tags such as `erp,gestao`
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Companies and products waiting for approval (administrator)
    Pending,
    /// Approve a company (administrator)
    ApproveCompany { id: String },
    /// Approve a product (administrator)
    ApproveProduct { id: String },
    /// Set a product discount between 0 and 50 percent (administrator)
    Discount { id: String, percent: i64 },
    /// Every transaction as CSV (administrator)
    ExportAdmin,
    /// One company's transactions as CSV (administrator or that company)
    ExportCompany { id: String },
}

/// Company registration form fields
#[derive(Debug, Args)]
struct CompanyArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    company_email: String,
    /// CNPJ, masked or digits only
    #[arg(long)]
    cnpj: String,
    #[arg(long, default_value = "")]
    area: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    representative: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    website: Option<String>,
}

impl From<&CompanyArgs> for NewCompany {
    fn from(args: &CompanyArgs) -> Self {
        Self {
            name: args.name.clone(),
            email: args.company_email.clone(),
            tax_id: args.cnpj.clone(),
            area_of_activity: args.area.clone(),
            description: args.description.clone(),
            representative_name: args.representative.clone(),
            phone: args.phone.clone(),
            website: args.website.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env before clap reads its env fallbacks
    dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env();

    // 3. Open the store
    if settings.database_url == database::DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect_err(|e| error!("Failed to open database: {}", e))?;
    database::create_tables(&db).await?;
    let storage = SqliteStorage::new(db);

    // 4. Seed a fresh store
    if settings.seed_path.exists() {
        let seed_file = seed::load_seed(&settings.seed_path)
            .inspect_err(|e| error!("Failed to load seed file: {}", e))?;
        seed::seed_storage(&storage, seed_file).await?;
    } else {
        info!(
            "No seed file at {}, starting with stored data only",
            settings.seed_path.display()
        );
    }

    // 5. Run the command
    let snapshot = Snapshot::load(&storage).await?;
    run(&cli, &storage, &snapshot)
        .await
        .inspect_err(|e| error!("{}", e))
}

async fn run(cli: &Cli, storage: &SqliteStorage, snapshot: &Snapshot) -> Result<()> {
    match &cli.command {
        Command::Stats => {
            login(cli, snapshot)?.require_admin()?;
            let stats = report::platform_stats(snapshot);
            println!("Empresas cadastradas: {}", stats.total_companies);
            println!("Produtos cadastrados: {}", stats.total_products);
            println!("Volume total: {}", report::format_brl(stats.total_volume));
            for transaction in &snapshot.transactions {
                let view =
                    TransactionView::resolve(transaction, &snapshot.products, &snapshot.companies);
                println!(
                    "{} | {} | Vendedor: {} | Comprador: {} | {} | {}",
                    report::format_date(transaction.created_at),
                    view.product_label(),
                    view.seller_label(),
                    view.buyer_label(),
                    report::format_brl(transaction.final_price),
                    report::status_label(transaction.status)
                );
            }
        }
        Command::Dashboard => {
            login(cli, snapshot)?;
            let stats = report::dashboard_stats(snapshot);
            println!("Empresas ativas: {}", stats.total_companies);
            println!("Produtos disponíveis: {}", stats.total_products);
            println!("Transações concluídas: {}", stats.total_transactions);
            println!("Receita: {}", report::format_brl(stats.total_revenue));
            for transaction in recent_transactions(&snapshot.transactions, RECENT_TRANSACTIONS_LIMIT) {
                let view =
                    TransactionView::resolve(&transaction, &snapshot.products, &snapshot.companies);
                println!(
                    "{} | {} | {}",
                    report::format_date(transaction.created_at),
                    view.product_label(),
                    report::format_brl(transaction.final_price)
                );
            }
        }
        Command::TopCompanies { limit } => {
            let ranked = top_by_activity(
                &snapshot.companies,
                &snapshot.transactions,
                &snapshot.products,
                *limit,
            );
            for (position, activity) in ranked.iter().enumerate() {
                println!(
                    "{}. {} - {} produtos, {} vendas",
                    position + 1,
                    activity.company.name,
                    activity.products_count,
                    activity.transactions_count
                );
            }
        }
        Command::Catalog {
            search,
            category,
            price,
            page,
        } => {
            let criteria = ProductCriteria {
                search_text: search.clone(),
                category: category.clone(),
                price: *price,
            };
            let approved = filter_by_approval(&snapshot.products, true);
            let products = filter_products(&approved, &criteria);
            let page = paginate(&products, *page, CATALOG_PAGE_SIZE);

            let stats = report::catalog_stats(snapshot);
            println!(
                "{} produtos, {} empresas, desconto médio {}%",
                stats.total_products, stats.total_companies, stats.avg_discount
            );
            for product in &page.items {
                println!(
                    "{} | {} | {} | {}",
                    product.id,
                    product.name,
                    product.category,
                    report::format_brl(product.final_price())
                );
            }
            println!("Página {} de {}", page.page, page.total_pages.max(1));
        }
        Command::History {
            status,
            period,
            search,
            page,
        } => {
            let session = login(cli, snapshot)?;
            let company_id = session.require_company()?;
            let criteria = TransactionCriteria {
                status: status.as_deref().map(parse_status).transpose()?,
                period: *period,
                search_text: search.clone(),
            };

            let own = transactions_for_company(&snapshot.transactions, company_id);
            let filtered = filter_transactions(
                &own,
                &snapshot.products,
                &snapshot.companies,
                &criteria,
                Utc::now(),
            );
            let page = paginate(&filtered, *page, TRANSACTIONS_PAGE_SIZE);

            let summary = report::company_summary(&snapshot.transactions, company_id);
            println!(
                "Gasto: {} | Economia: {} | Transações: {} | Desconto médio: {}%",
                report::format_brl(summary.total_spent),
                report::format_brl(summary.total_saved),
                summary.total_transactions,
                summary.avg_discount
            );
            for transaction in &page.items {
                let view =
                    TransactionView::resolve(transaction, &snapshot.products, &snapshot.companies);
                println!(
                    "{} | {} | {} | {} | {}% | {} | {}",
                    transaction.id,
                    report::format_date(transaction.created_at),
                    view.product_label(),
                    view.company_label(),
                    transaction.discount_percent,
                    report::format_brl(transaction.final_price),
                    report::status_label(transaction.status)
                );
            }
            println!("Página {} de {}", page.page, page.total_pages.max(1));
        }
        Command::Buy { product_id } => {
            let session = login(cli, snapshot)?;
            let bought = transaction::purchase(storage, &session, product_id).await?;
            println!(
                "Compra {} registrada: {} ({}% de desconto)",
                bought.id,
                report::format_brl(bought.final_price),
                bought.discount_percent
            );
        }
        Command::Receipt { id } => {
            let session = login(cli, snapshot)?;
            println!("{}", transaction::receipt(snapshot, &session, id)?);
        }
        Command::Register {
            company: form,
            account_password,
            confirm_password,
        } => {
            let input = NewAccount {
                company: form.into(),
                password: account_password.clone(),
                confirm_password: confirm_password.clone(),
            };
            let (registered, user) = company::register_account(storage, input).await?;
            println!(
                "Empresa {} cadastrada ({}), aguardando aprovação. Login: {}",
                registered.name, registered.id, user.email
            );
        }
        Command::RegisterCompany { company: form } => {
            let registered = company::register_company(storage, form.into()).await?;
            println!(
                "Empresa {} cadastrada ({}), aguardando aprovação",
                registered.name, registered.id
            );
        }
        Command::AddProduct {
            name,
            category,
            price,
            description,
            tags,
        } => {
            let session = login(cli, snapshot)?;
            let input = NewProduct {
                name: name.clone(),
                category: category.clone(),
                price: *price,
                description: description.clone(),
                tags: tags.clone(),
            };
            let listed = product::add_product(storage, &session, input).await?;
            println!(
                "Produto {} cadastrado ({}), aguardando aprovação",
                listed.name, listed.id
            );
        }
        Command::Pending => {
            login(cli, snapshot)?.require_admin()?;
            for company in filter_by_approval(&snapshot.companies, false) {
                println!(
                    "empresa {} | {} | {}",
                    company.id, company.name, company.tax_id
                );
            }
            for product in filter_by_approval(&snapshot.products, false) {
                println!(
                    "produto {} | {} | {}",
                    product.id,
                    product.name,
                    report::format_brl(product.price)
                );
            }
        }
        Command::ApproveCompany { id } => {
            let session = login(cli, snapshot)?;
            let approved = company::approve_company(storage, &session, id).await?;
            println!("Empresa {} aprovada", approved.name);
        }
        Command::ApproveProduct { id } => {
            let session = login(cli, snapshot)?;
            let approved = product::approve_product(storage, &session, id).await?;
            println!("Produto {} aprovado", approved.name);
        }
        Command::Discount { id, percent } => {
            let session = login(cli, snapshot)?;
            let updated = product::set_discount(storage, &session, id, *percent).await?;
            println!(
                "Desconto de {}% aplicado em {} ({})",
                percent,
                updated.name,
                report::format_brl(updated.final_price())
            );
        }
        Command::ExportAdmin => {
            login(cli, snapshot)?.require_admin()?;
            println!("{}", report::export_admin_csv(snapshot));
        }
        Command::ExportCompany { id } => {
            let session = login(cli, snapshot)?;
            match &session {
                Session::Company { company_id, .. } if company_id != id => {
                    return Err(Error::Unauthorized {
                        message: format!("cannot export transactions of company {id}"),
                    });
                }
                _ => {}
            }
            println!("{}", report::export_company_csv(snapshot, id));
        }
    }
    Ok(())
}

fn parse_status(text: &str) -> Result<TransactionStatus> {
    match text {
        "pending" => Ok(TransactionStatus::Pending),
        "completed" => Ok(TransactionStatus::Completed),
        "cancelled" => Ok(TransactionStatus::Cancelled),
        other => Err(Error::validation("status", format!("'{other}'"))),
    }
}

fn login(cli: &Cli, snapshot: &Snapshot) -> Result<Session> {
    let (Some(email), Some(password)) = (cli.email.as_deref(), cli.password.as_deref()) else {
        return Err(Error::Unauthorized {
            message: "--email and --password are required for this command".to_string(),
        });
    };

    let verifier = StoredCredentials::new(snapshot.users.clone());
    Session::login(&verifier, email, password)
}
