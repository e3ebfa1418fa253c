use clap::Args;
use educe::Educe;
use url::Url;

#[derive(Args, Debug, Educe, Clone)]
#[educe(Default)]
pub struct MongoConfig {
    /// Keep the blogs in memory instead of MongoDB. This should not be used in production.
    #[clap(long, env = "BLOGS_IN_MEMORY_STORE", default_value_t = false)]
    pub in_memory_store: bool,
    #[educe(Default = Url::parse("mongodb://localhost:27017").expect("default MongoDB url should be valid"))]
    #[arg(long, env = "MONGO_DB_URI", default_value = "mongodb://localhost:27017")]
    /// MongoDB url like `mongodb://[USER:PASSWORD@]HOST[:PORT][/?OPTIONS]`
    pub mongo_db_uri: Url,
    #[educe(Default = "mongoDemo".into())]
    #[arg(long, env = "MONGO_DATABASE", default_value = "mongoDemo")]
    pub mongo_database: String,
}

impl MongoConfig {
    pub fn into_store_config(self) -> database::Config {
        if self.in_memory_store {
            database::Config::InMemory {
                database: self.mongo_database,
            }
        } else {
            database::Config::Mongo {
                url: self.mongo_db_uri,
                database: self.mongo_database,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        mongo: MongoConfig,
    }

    #[test]
    fn defaults() {
        let config = MongoConfig::default();
        assert!(!config.in_memory_store);
        assert_eq!(config.mongo_database, "mongoDemo");
        assert!(matches!(
            config.into_store_config(),
            database::Config::Mongo { database, .. } if database == "mongoDemo"
        ));
    }

    #[test]
    fn in_memory_store_flag() {
        let cli = Cli::parse_from(["blogs", "--in-memory-store", "--mongo-database", "drafts"]);
        assert!(matches!(
            cli.mongo.into_store_config(),
            database::Config::InMemory { database } if database == "drafts"
        ));
    }
}
