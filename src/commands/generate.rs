//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Spacetraveling;

/// Generate the site from the content repository
pub async fn run(app: &Spacetraveling) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(app, app.client()?)?;
    generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
