//! `paytr`: operator commands for the PayTR iFrame API.
//!
//! Credentials and defaults come from the environment (or a `.env` file);
//! see `MerchantConfig`.

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paytr::{
    encode_basket, to_minor_units, BasketItem, ConfigError, Customer, Installments,
    MerchantConfig, OrderRequest, PaytrClient, PaytrError, RefundRequest,
};

#[derive(Parser, Debug)]
#[command(name = "paytr", version, about = "PayTR iFrame API client")]
struct Cli {
    /// Log HTTP exchanges at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request an iframe token for a new order
    Token(TokenArgs),
    /// Query settlement state and refunds of an order
    Status {
        #[arg(long)]
        oid: String,
    },
    /// Refund part or all of a settled order
    Refund {
        #[arg(long)]
        oid: String,
        /// Major units, e.g. "11.97"
        #[arg(long)]
        amount: String,
        /// Merchant reference for this refund
        #[arg(long)]
        reference: Option<String>,
    },
    /// Print the encoded basket for the given items
    Basket {
        /// name:unit_price:qty, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<BasketItem>,
    },
}

#[derive(Args, Debug)]
struct TokenArgs {
    /// Merchant order id; generated when omitted
    #[arg(long)]
    oid: Option<String>,

    #[arg(long)]
    email: String,

    /// Amount in minor units ("999" = 9.99)
    #[arg(long, conflicts_with = "price", required_unless_present = "price")]
    amount: Option<String>,

    /// Amount in major units ("9.99")
    #[arg(long)]
    price: Option<String>,

    /// Basket line name:unit_price:qty, repeatable
    #[arg(long = "item", conflicts_with = "basket", required_unless_present = "basket")]
    items: Vec<BasketItem>,

    /// Pre-encoded basket
    #[arg(long)]
    basket: Option<String>,

    /// Buyer's public IP address
    #[arg(long)]
    user_ip: String,

    #[arg(long, default_value = "")]
    name: String,

    #[arg(long, default_value = "")]
    address: String,

    #[arg(long, default_value = "")]
    phone: String,

    #[arg(long, default_value_t = 0)]
    max_installment: u8,

    #[arg(long)]
    no_installment: bool,

    /// Minutes the hosted page stays valid
    #[arg(long)]
    timeout: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Paytr(#[from] PaytrError),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,paytr=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn connect() -> Result<(MerchantConfig, PaytrClient), CliError> {
    let config = MerchantConfig::from_env()?;
    let client =
        PaytrClient::new(config.credentials.clone())?.with_endpoints(config.endpoints.clone());
    Ok((config, client))
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Token(args) => {
            let (config, client) = connect()?;
            let order = build_order(&config, args)?;
            let token = client.request_token(&order).await?;
            println!("merchant_oid: {}", order.merchant_oid);
            println!("token:        {token}");
            println!("iframe:       {}", token.iframe_url(client.endpoints()));
        }
        Command::Status { oid } => {
            let (_, client) = connect()?;
            let report = client.query_status(&oid).await?;
            println!("{} {}", report.payment_amount, report.currency);
            println!("{} {}", report.payment_total, report.currency);
            for r in &report.returns {
                println!(
                    "{} {} {} {}",
                    r.return_amount, r.return_date, r.return_type, r.reference_no
                );
            }
        }
        Command::Refund {
            oid,
            amount,
            reference,
        } => {
            let (_, client) = connect()?;
            let mut request = RefundRequest::new(oid, amount);
            if let Some(reference) = reference {
                request = request.with_reference(reference);
            }
            let receipt = client.refund(&request).await?;
            println!(
                "refunded {} on {}{}",
                receipt.return_amount,
                receipt.merchant_oid,
                if receipt.is_test() { " (test)" } else { "" }
            );
        }
        // No credentials needed.
        Command::Basket { items } => println!("{}", encode_basket(&items)?),
    }
    Ok(())
}

fn build_order(config: &MerchantConfig, args: TokenArgs) -> Result<OrderRequest, CliError> {
    let (ok_url, fail_url) = config.redirect_urls()?;

    let amount = match (args.amount, args.price) {
        (Some(minor), _) => minor,
        (None, Some(major)) => to_minor_units(&major)?,
        (None, None) => {
            return Err(PaytrError::InvalidRequest("--amount or --price is required".into()).into())
        }
    };

    let basket = match args.basket {
        Some(encoded) => encoded,
        None => encode_basket(&args.items)?,
    };

    let oid = args
        .oid
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

    let mut builder = OrderRequest::builder(oid, args.email, amount)
        .basket(basket)
        .user_ip(args.user_ip)
        .currency(config.currency)
        .installments(Installments {
            no_installment: args.no_installment,
            max_installment: args.max_installment,
        })
        .customer(Customer {
            name: args.name,
            address: args.address,
            phone: args.phone,
        })
        .redirect_urls(ok_url, fail_url)
        .test_mode(config.test_mode)
        .lang(config.language.clone());
    if let Some(minutes) = args.timeout {
        builder = builder.timeout_limit(minutes);
    }

    Ok(builder.build()?)
}
