use clap::{Arg, Command};
use letsrevoke_authority::Config;
use letsrevoke_cryptography::{ed25519::PrivateKey, Signer as _};
use rand::rngs::OsRng;
use std::net::SocketAddr;
use tracing::info;

fn main() {
    // Create logger
    tracing_subscriber::fmt().init();

    // Parse arguments
    let matches = Command::new("setup")
        .about("generate a signing key and configuration file")
        .arg(
            Arg::new("listen")
                .long("listen")
                .default_value("127.0.0.1:8080"),
        )
        .arg(Arg::new("output").long("output").required(true))
        .get_matches();
    let listen: SocketAddr = matches
        .get_one::<String>("listen")
        .unwrap()
        .parse()
        .expect("Could not parse listen address");
    let output = matches.get_one::<String>("output").unwrap();

    // Generate signing key
    let private_key = PrivateKey::from_rng(&mut OsRng);
    let public_key = private_key.public_key();
    info!(authority = %public_key, "generated signing key");

    // Write config
    let config = Config::new(listen, &private_key);
    let raw = serde_yaml::to_string(&config).expect("Could not serialize config");
    std::fs::write(output, raw).expect("Could not write config file");
    info!(output = %output, "wrote config");
}
