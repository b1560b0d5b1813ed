use clap::{CommandFactory, Parser};
use media_ascii_cli::cli::Cli;
use media_ascii_cli::pipeline::run;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        println!();
        return;
    }

    let cli = Cli::parse();
    let result = cli.into_config().and_then(|config| run(&config));

    match result {
        Ok(stats) => log::info!(
            "processed {} frame(s){}",
            stats.frames_processed,
            if stats.replayed_from_cache { " from cache" } else { "" }
        ),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
