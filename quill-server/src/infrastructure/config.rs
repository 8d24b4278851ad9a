use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    pub storage_url: String,
    pub storage_public_url: String,
    pub storage_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let storage_url = std::env::var("STORAGE_URL")
            .map_err(|_| anyhow::anyhow!("STORAGE_URL must be set"))?;
        let storage_public_url =
            std::env::var("STORAGE_PUBLIC_URL").unwrap_or_else(|_| storage_url.clone());
        let storage_token = std::env::var("STORAGE_TOKEN").ok();

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            cors_origins,
            storage_url,
            storage_public_url,
            storage_token,
        })
    }
}
