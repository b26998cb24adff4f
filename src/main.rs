use std::env;
use std::path::Path;
use std::process::ExitCode;

use stampwise::config::job::JobFile;
use stampwise::config::merged::MergedConfig;
use stampwise::config::settings::Settings;
use stampwise::pipeline::{CancelFlag, run_all_jobs};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: stampwise <jobs.yaml>...");
        return ExitCode::FAILURE;
    }

    let cancel = CancelFlag::new();
    let mut failed = false;

    for job_file in &args[1..] {
        let path = Path::new(job_file);
        let configs = match load_job_configs(path) {
            Ok(configs) => configs,
            Err(e) => {
                eprintln!("{job_file}: {e}");
                failed = true;
                continue;
            }
        };

        for (config, result) in configs.iter().zip(run_all_jobs(&configs, &cancel)) {
            match result {
                Ok(job) => println!(
                    "{} -> {}: {} stamped, {} skipped of {} pages",
                    config.input.display(),
                    job.output_dir.display(),
                    job.pages_stamped,
                    job.pages_skipped,
                    job.pages_total
                ),
                Err(e) => {
                    eprintln!("{}: {e}", config.input.display());
                    failed = true;
                }
            }
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn load_job_configs(path: &Path) -> stampwise::Result<Vec<MergedConfig>> {
    let settings = Settings::for_job_file(path)?;
    let job_file = JobFile::from_file(path)?;
    Ok(job_file
        .jobs
        .iter()
        .map(|job| MergedConfig::new(&settings, job))
        .collect())
}
