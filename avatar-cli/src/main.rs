use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use avatar_chain::{
    file_name::avatar_file_name,
    parse_profile_url,
    settings::{EgressSettings, ResolverSettings},
    AvatarResolver, EgressOutcome, FetchedImage, ImageEgress, ReqwestFetcher, RetrievalRequest,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avatar-cli", about = "Download the profile picture behind a social profile URL")]
struct Opts {
    /// Facebook, Instagram or Twitter/X profile URL
    profile_url: String,

    /// Directory the avatar is written to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Only print the resolved URL
    #[arg(long)]
    url_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename(".env.local").ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    let profile = parse_profile_url(&opts.profile_url)?;
    println!(
        "{} profile: {}{}",
        profile.platform.display_name(),
        profile.username,
        if profile.numeric_id { " (numeric id)" } else { "" }
    );

    let settings = ResolverSettings::default();
    let fetcher = Arc::new(
        ReqwestFetcher::new(settings.request_timeout())
            .map_err(|e| anyhow::anyhow!("Error creating HTTP client: {}", e))?,
    );
    let resolver = AvatarResolver::new(fetcher.clone(), settings);

    let result = resolver
        .resolve_request(&RetrievalRequest::new(profile.platform, &profile.username))
        .await;
    let avatar_url = result
        .avatar_url
        .context("Resolver returned no avatar URL")?;

    println!("Avatar URL: {avatar_url}");
    if let Some(warning) = &result.warning {
        eprintln!("Warning: {warning}");
    }
    if opts.url_only {
        return Ok(());
    }

    let egress = ImageEgress::new(fetcher, EgressSettings::default());
    let image = match egress.fetch_image(&avatar_url).await {
        Ok(EgressOutcome::Image(image)) => image,
        Ok(EgressOutcome::Redirect(location)) => follow_redirect(&egress, &location).await?,
        Err(err) => match err.fallback_url() {
            Some(fallback) => {
                eprintln!("Download failed ({err}), using {fallback}");
                follow_redirect(&egress, fallback).await?
            }
            None => return Err(err.into()),
        },
    };

    let file_name = avatar_file_name(profile.platform, &profile.username, &image.content_type);
    let path = opts.out.join(file_name);
    tokio::fs::create_dir_all(&opts.out)
        .await
        .with_context(|| format!("Error creating {}", opts.out.display()))?;
    tokio::fs::write(&path, &image.bytes)
        .await
        .with_context(|| format!("Error writing {}", path.display()))?;

    println!("Saved {} ({} bytes)", path.display(), image.bytes.len());
    Ok(())
}

async fn follow_redirect(egress: &ImageEgress, location: &str) -> anyhow::Result<FetchedImage> {
    egress
        .passthrough(location)
        .await
        .with_context(|| format!("Error downloading {location}"))
}
