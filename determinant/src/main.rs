use clap::Parser;
use determinant::config::{Command, Config};
use determinant::{BatchFile, Worker, random_batch, run_hub, run_local};
use rand::SeedableRng;
use rand::rngs::StdRng;
use role_exchange::{TcpExchange, TcpHub};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    match config.command {
        Command::Run { batch, roles } => {
            let source = BatchFile::new(batch.file);
            let report = run_local(&source, roles.roles, roles.engine).await?;
            println!("{report}");
        }
        Command::Coordinator {
            batch,
            roles,
            listen,
        } => {
            let hub = TcpHub::bind(listen).await?;
            let source = BatchFile::new(batch.file);
            let report = run_hub(hub, &source, roles.roles, roles.engine).await?;
            println!("{report}");
        }
        Command::Worker {
            connect,
            rank,
            roles,
        } => {
            let exchange = TcpExchange::connect(connect, rank, roles).await?;
            let computed = Worker::new(exchange).run().await?;
            info!(rank, computed, "worker done");
        }
        Command::Generate {
            batch,
            count,
            order,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let generated = random_batch(&mut rng, count, order)?;
            BatchFile::new(batch.file).save(&generated).await?;
        }
    }

    Ok(())
}
