use alloy_primitives::U256;
use clap::Parser;
use dotenvy::dotenv;
use hive_payment::PaymentClient;
use hive_payment::config::{CliArgs, Command, Config};
use hive_payment::util::{ShutdownSignal, Telemetry};
use hive_payment_eip155::LocalWalletTransport;
use hive_payment_eip155::chain::ChecksummedAddress;
use serde::Serialize;
use serde_json::json;
use std::error::Error;

/// Runs one `hive-payment` command.
///
/// - Loads `.env` variables.
/// - Installs the log subscriber.
/// - Opens a wallet session with the configured signer on the selected network.
/// - Executes the command, printing its result as JSON on stdout.
pub async fn run() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    let _telemetry = Telemetry::init();

    let args = CliArgs::parse();
    let config = Config::load(&args.config)?;
    let network = config.network(args.testnet);

    let transport = LocalWalletTransport::new(network.profile().clone(), *config.signer())?
        .with_rate_limit(config.rate_limit())
        .with_receipt_timeout(config.timeout());
    let mut client = PaymentClient::with_network(network, transport);
    client.initialize().await?;

    let result = execute(&mut client, args.command, &config).await;
    client.close().await;
    result
}

async fn execute(
    client: &mut PaymentClient<LocalWalletTransport>,
    command: Command,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Account => print_json(&json!({
            "network": client.session().profile().network,
            "account": client.account_address().map(ChecksummedAddress::from),
        })),
        Command::Pay { amount, to, memo } => {
            let timeout = config.pay_timeout();
            let order_id = tokio::time::timeout(timeout, client.pay_order(&amount, &to, &memo))
                .await
                .map_err(|_| {
                    format!(
                        "Payment did not settle within {}s; it may still be mined",
                        timeout.as_secs()
                    )
                })??;
            print_json(&json!({ "orderId": order_id.to_string() }))
        }
        Command::Orders => print_json(&client.orders().await?),
        Command::Order { id } => print_json(&client.order(U256::from(id)).await?),
        Command::OrderAt { index } => {
            print_json(&client.order_by_index(U256::from(index)).await?)
        }
        Command::OrderCount => {
            let count = client.order_count().await?;
            print_json(&json!({ "count": count.to_string() }))
        }
        Command::PlatformFee => print_json(&client.platform_fee().await?),
        Command::Watch => {
            let shutdown = ShutdownSignal::install()?;
            let watcher = client
                .watcher()?
                .with_poll_interval(config.poll_interval())
                .with_max_block_range(config.max_block_range());
            watcher
                .run(shutdown.token(), |event| match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "Failed to print OrderPay event"),
                })
                .await;
            shutdown.wait().await;
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
