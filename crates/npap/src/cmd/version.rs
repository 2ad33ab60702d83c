use npap_session::SessionConfig;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("npap {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let defaults = SessionConfig::default();
    println!("name: npap");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("printer_port: {}", npap_transport::PRINTER_PORT);
    println!("response_timeout: {:?}", defaults.response_timeout);
    println!("poll_interval: {:?}", defaults.poll_interval);
    println!("max_datagram_size: {}", defaults.max_datagram_size);
    println!(
        "features: session={}, cli=true",
        cfg!(feature = "session")
    );

    Ok(SUCCESS)
}
