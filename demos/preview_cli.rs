use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use link_preview::{Fetcher, PreviewService, PreviewServiceConfig};
use std::error::Error;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("preview_cli")
        .about("Fetch link previews and print them")
        .arg(
            Arg::new("urls")
                .required(true)
                .num_args(1..)
                .help("URLs to preview"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .default_value("10")
                .value_parser(clap::value_parser!(u64))
                .help("Request timeout in seconds"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print previews as JSON"),
        )
        .get_matches();

    let urls: Vec<String> = matches
        .get_many::<String>("urls")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let timeout = *matches.get_one::<u64>("timeout").unwrap_or(&10);
    let as_json = matches.get_flag("json");

    let fetcher = Fetcher::new_with_custom_config(
        Duration::from_secs(timeout),
        link_preview::BROWSER_USER_AGENT,
    );
    let service =
        PreviewService::new_with_config(PreviewServiceConfig::default().with_fetcher(fetcher));

    #[cfg(feature = "logging")]
    link_preview::setup_logging(link_preview::LogConfig {
        file_output: false,
        ..Default::default()
    })?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Fetching {} previews...", urls.len()));

    let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let results = service.generate_previews(&refs).await;
    pb.finish_and_clear();

    for (url, result) in urls.iter().zip(results) {
        #[cfg(feature = "logging")]
        match &result {
            Ok(preview) => link_preview::log_preview_card(preview, url),
            Err(e) => link_preview::log_error_card(url, e),
        }

        match result {
            Ok(preview) if as_json => println!("{}", preview.to_json()?),
            Ok(preview) => {
                println!("\n{}", "Link Preview".bold().blue());
                println!("{}", "---------------".blue());
                println!("{}: {}", "Requested".bold(), url);
                println!("{}: {}", "URL".bold(), preview.url);
                println!("{}: {}", "Title".bold(), preview.title);
                if let Some(description) = &preview.description {
                    println!("{}: {}", "Description".bold(), description);
                }
                for image in &preview.images {
                    println!("{}: {}", "Image".bold(), image.src);
                }
                for (name, value) in &preview.extra {
                    println!("{}: {}", format!("og:{name}").bold(), value);
                }
            }
            Err(e) => {
                let kind = if e.is_not_found() { "Not found" } else { "Error" };
                eprintln!("{}: {} - {}", kind.bold().red(), url, e);
            }
        }
    }

    println!("\n{} {} URLs processed", "Done:".green().bold(), urls.len());
    Ok(())
}
