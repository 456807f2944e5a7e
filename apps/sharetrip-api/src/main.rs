use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = sharetrip_api::Args::parse();

	sharetrip_api::run(args).await
}
