use clap::Parser;

use ipdistance::config::{Args, StaticConfig};
use ipdistance::errors::IpDistanceError;
use ipdistance::runtime::modes::run_server;
use ipdistance::system::init_logging;

#[actix_web::main]
async fn main() {
    let args = Args::parse();

    if args.generate_config {
        print!("{}", StaticConfig::generate_sample_config());
        return;
    }

    dotenvy::dotenv().ok();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    // guard 必须存活到进程退出
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server(&config).await {
        match e.downcast_ref::<IpDistanceError>() {
            Some(inner) => eprintln!("{}\n  {:#}", inner.format_colored(), e),
            None => eprintln!("Server error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> ipdistance::errors::Result<StaticConfig> {
    let mut config = StaticConfig::load(args.config.as_deref())?;
    config.apply_args(args);
    config.validate()?;
    Ok(config)
}
