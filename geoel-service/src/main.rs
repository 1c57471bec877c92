//! geoel service - HTTP microservice for terrain elevation queries.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GEOEL_DATA_DIR` | Root holding `etopo/`, `globe/`, `srtm3/`, `srtm1/` | home directory |
//! | `GEOEL_CACHE_SIZE` | Maximum open tiles per dataset, `0` = unbounded | unbounded |
//! | `GEOEL_SRTM1` | Use SRTM1 from zoom 15 on | false |
//! | `GEOEL_DOWNLOAD_SOURCE` | Named source: `ardupilot` | None |
//! | `GEOEL_DOWNLOAD_URL_<DATASET>` | URL template per dataset | None |
//! | `GEOEL_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log filter | `geoel=info,geoel_service=info,tower_http=info` |
//!
//! ## Endpoints
//!
//! - `GET /elevation?lat=X&lon=Y&zoom=Z` - Elevation at one coordinate
//! - `POST /elevation` - Batch elevation query
//! - `GET /health` - Health check
//! - `GET /stats` - Cache statistics per dataset
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use geoel::ElevationLayerBuilder;
use geoel_service::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PORT_ENV: &str = "GEOEL_PORT";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoel=info,geoel_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var(PORT_ENV)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // Building may create HTTP clients, which must not happen on the runtime
    let layer = tokio::task::spawn_blocking(|| ElevationLayerBuilder::from_env().build()).await??;

    tracing::info!(
        data_root = %layer.data_root().display(),
        srtm1 = layer.srtm1_enabled(),
        port = port,
        "Starting geoel service"
    );

    let app = geoel_service::router(Arc::new(AppState { layer }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
