use clap::Parser;
use clap::error::ErrorKind;
use tokio_util::sync::CancellationToken;

mod cli;
mod exit_codes;
mod interactive;
mod report;
mod run;

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                _ => exit_codes::CONFIG_ERROR,
            };
            std::process::exit(code);
        }
    };

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();

    if let Err(e) = run::ensure_script_or_tty(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(exit_codes::CONFIG_ERROR);
    }

    let cancel = CancellationToken::new();
    let exit_code = if cli.run_once {
        // In raw mode Ctrl-C arrives as a key; this covers scripted runs and
        // signals sent from outside.
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("interrupt received, aborting run");
                on_signal.cancel();
            }
        });
        run::execute(&cli, &cancel).await
    } else {
        interactive::execute(&cli, &cancel).await
    };

    std::process::exit(exit_code);
}
