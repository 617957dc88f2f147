use clap::{Arg, Command};
use letsrevoke_authority::{serve, Config, State};
use tracing::{info, Level};

fn main() {
    // Create logger
    tracing_subscriber::fmt()
        .json()
        .with_max_level(Level::DEBUG)
        .with_line_number(true)
        .with_file(true)
        .init();

    // Parse arguments
    let matches = Command::new("authority")
        .about("produce signed revocation dictionaries")
        .arg(Arg::new("config").long("config").required(true))
        .get_matches();

    // Load config
    let config_file = matches.get_one::<String>("config").unwrap();
    let config = Config::load(config_file).expect("Could not load config file");
    let producer = config.producer().expect("Could not create producer");

    // Start runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Could not create runtime");
    runtime.block_on(async move {
        let state = State::new(producer);
        info!(
            listen = %config.listen,
            authority = %state.authority,
            max_population = config.max_population,
            build_timeout_ms = config.build_timeout_ms,
            "starting authority"
        );
        let listener = tokio::net::TcpListener::bind(config.listen)
            .await
            .expect("Could not bind to listen address");
        serve(listener, state).await.expect("Could not serve");
    });
}
