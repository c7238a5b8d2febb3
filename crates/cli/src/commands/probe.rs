//! One-shot reachability check

use std::process::ExitCode;

use terrasync_core::ports::Connectivity;
use terrasync_domain::Config;
use terrasync_infra::TcpProbe;

pub async fn run(config: &Config) -> ExitCode {
    let probe = TcpProbe::from_config(config.ftp.host.clone(), &config.probe);

    if probe.is_reachable().await {
        println!("{} is reachable", config.ftp.host);
        ExitCode::SUCCESS
    } else {
        println!("{} is not reachable", config.ftp.host);
        ExitCode::from(2)
    }
}
