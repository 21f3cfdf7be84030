use strum::Display;
use types::config::ChainConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PredefinedNetwork {
    Mainnet,
    Sepolia,
    Holesky,
    Hoodi,
}

impl PredefinedNetwork {
    #[must_use]
    pub const fn chain_config(self) -> ChainConfig {
        match self {
            Self::Mainnet => ChainConfig::mainnet(),
            Self::Sepolia => ChainConfig::sepolia(),
            Self::Holesky => ChainConfig::holesky(),
            Self::Hoodi => ChainConfig::hoodi(),
        }
    }
}
