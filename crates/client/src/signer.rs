//! Wallet construction for the three supported signing methods.

use crate::ClientError;
use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_signer::Signer;
use alloy_signer_local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use std::fmt;
use tracing::info;

/// BIP-44 path of the first Ethereum account.
pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0/0";

/// How the L1 transactions get signed.
#[derive(Clone, PartialEq, Eq)]
pub enum SignerMethod {
    PrivateKey(String),
    Mnemonic { phrase: String, hd_path: String },
    Ledger { hd_path: String },
}

impl fmt::Debug for SignerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateKey(_) => f.write_str("PrivateKey(<redacted>)"),
            Self::Mnemonic { hd_path, .. } => f
                .debug_struct("Mnemonic")
                .field("phrase", &"<redacted>")
                .field("hd_path", hd_path)
                .finish(),
            Self::Ledger { hd_path } => f.debug_struct("Ledger").field("hd_path", hd_path).finish(),
        }
    }
}

impl SignerMethod {
    /// Pick the signing method from the CLI flags; exactly one must be set.
    pub fn from_flags(
        private_key: Option<String>,
        mnemonic: Option<String>,
        ledger: bool,
        hd_path: impl Into<String>,
    ) -> Result<Self, ClientError> {
        match (private_key, mnemonic, ledger) {
            (Some(key), None, false) => Ok(Self::PrivateKey(key)),
            (None, Some(phrase), false) => Ok(Self::Mnemonic {
                phrase,
                hd_path: hd_path.into(),
            }),
            (None, None, true) => Ok(Self::Ledger {
                hd_path: hd_path.into(),
            }),
            _ => Err(ClientError::SignerSelection),
        }
    }
}

/// Build the wallet for `method`, bound to `chain_id`.
///
/// Returns the wallet and the address it signs for.
pub async fn create_wallet(
    method: &SignerMethod,
    chain_id: u64,
) -> Result<(EthereumWallet, Address), ClientError> {
    match method {
        SignerMethod::PrivateKey(key) => {
            let signer: PrivateKeySigner = key
                .trim_start_matches("0x")
                .parse()
                .map_err(|e| ClientError::InvalidPrivateKey(format!("{e}")))?;
            Ok(local_wallet(signer, chain_id))
        }
        SignerMethod::Mnemonic { phrase, hd_path } => {
            let signer = MnemonicBuilder::<English>::default()
                .phrase(phrase.as_str())
                .derivation_path(hd_path)
                .and_then(|builder| builder.build())
                .map_err(|e| ClientError::InvalidMnemonic(format!("{e}")))?;
            Ok(local_wallet(signer, chain_id))
        }
        SignerMethod::Ledger { hd_path } => ledger_wallet(hd_path, chain_id).await,
    }
}

fn local_wallet(signer: PrivateKeySigner, chain_id: u64) -> (EthereumWallet, Address) {
    let signer = signer.with_chain_id(Some(chain_id));
    let address = signer.address();
    info!(%address, "Using local signer");
    (EthereumWallet::from(signer), address)
}

#[cfg(feature = "ledger")]
async fn ledger_wallet(
    hd_path: &str,
    chain_id: u64,
) -> Result<(EthereumWallet, Address), ClientError> {
    use alloy_signer_ledger::{HDPath, LedgerSigner};

    let signer = LedgerSigner::new(HDPath::Other(hd_path.to_string()), Some(chain_id))
        .await
        .map_err(|e| ClientError::Ledger(format!("{e}")))?;
    let address = signer.address();
    info!(%address, hd_path, "Using Ledger signer");
    Ok((EthereumWallet::from(signer), address))
}

#[cfg(not(feature = "ledger"))]
async fn ledger_wallet(
    _hd_path: &str,
    _chain_id: u64,
) -> Result<(EthereumWallet, Address), ClientError> {
    Err(ClientError::Ledger(
        "this build has no Ledger support (enable the `ledger` feature)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    // Well-known anvil account #0
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";
    const TEST_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[test]
    fn test_exactly_one_signer_method() {
        let method =
            SignerMethod::from_flags(Some("key".into()), None, false, DEFAULT_HD_PATH).unwrap();
        assert!(matches!(method, SignerMethod::PrivateKey(_)));

        let method = SignerMethod::from_flags(None, None, true, "m/44'/60'/1'/0/0").unwrap();
        assert_eq!(
            method,
            SignerMethod::Ledger {
                hd_path: "m/44'/60'/1'/0/0".into()
            }
        );

        assert!(matches!(
            SignerMethod::from_flags(None, None, false, DEFAULT_HD_PATH),
            Err(ClientError::SignerSelection)
        ));
        assert!(matches!(
            SignerMethod::from_flags(Some("key".into()), Some("words".into()), false, DEFAULT_HD_PATH),
            Err(ClientError::SignerSelection)
        ));
        assert!(matches!(
            SignerMethod::from_flags(Some("key".into()), None, true, DEFAULT_HD_PATH),
            Err(ClientError::SignerSelection)
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let method = SignerMethod::Mnemonic {
            phrase: TEST_MNEMONIC.into(),
            hd_path: DEFAULT_HD_PATH.into(),
        };
        let debug = format!("{method:?}");
        assert!(!debug.contains("junk"));
        assert!(debug.contains(DEFAULT_HD_PATH));

        let debug = format!("{:?}", SignerMethod::PrivateKey(TEST_KEY.into()));
        assert!(!debug.contains("ac0974"));
    }

    #[tokio::test]
    async fn test_private_key_and_mnemonic_agree() {
        let (_, from_key) = create_wallet(&SignerMethod::PrivateKey(TEST_KEY.into()), 1)
            .await
            .unwrap();
        let (_, from_mnemonic) = create_wallet(
            &SignerMethod::Mnemonic {
                phrase: TEST_MNEMONIC.into(),
                hd_path: DEFAULT_HD_PATH.into(),
            },
            1,
        )
        .await
        .unwrap();

        assert_eq!(from_key, TEST_ADDRESS);
        assert_eq!(from_mnemonic, TEST_ADDRESS);
    }

    #[tokio::test]
    async fn test_invalid_private_key() {
        let err = create_wallet(&SignerMethod::PrivateKey("0x1234".into()), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidPrivateKey(_)));
    }

    #[cfg(not(feature = "ledger"))]
    #[tokio::test]
    async fn test_ledger_requires_feature() {
        let err = create_wallet(
            &SignerMethod::Ledger {
                hd_path: DEFAULT_HD_PATH.into(),
            },
            1,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("ledger"));
    }
}
