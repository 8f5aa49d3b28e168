use std::fmt::Debug;

use subxt::{
    ext::{
        sp_core::{
            crypto::Ss58Codec, ecdsa::Pair as ECDSAPair, ed25519::Pair as Ed25519Pair,
            sr25519::Pair as Sr25519Pair, Pair,
        },
        sp_runtime::MultiSigner,
    },
    tx::PairSigner,
};

use crate::CreditcoinConfig;

/// Any of the keypair kinds a Creditcoin account can sign with.
///
/// Wraps [`PairSigner`] so the CLI can pick the scheme at runtime.
#[derive(Clone)]
pub enum MultiPairSigner {
    Sr25519(PairSigner<CreditcoinConfig, Sr25519Pair>),
    ECDSA(PairSigner<CreditcoinConfig, ECDSAPair>),
    Ed25519(PairSigner<CreditcoinConfig, Ed25519Pair>),
}

impl MultiPairSigner {
    /// Build a signer out of the first key present, in parameter order.
    pub fn new(
        sr25519_key: Option<Sr25519Pair>,
        ecdsa_key: Option<ECDSAPair>,
        ed25519_key: Option<Ed25519Pair>,
    ) -> Option<Self> {
        match (sr25519_key, ecdsa_key, ed25519_key) {
            (Some(key), _, _) => Some(Self::Sr25519(PairSigner::new(key))),
            (_, Some(key), _) => Some(Self::ECDSA(PairSigner::new(key))),
            (_, _, Some(key)) => Some(Self::Ed25519(PairSigner::new(key))),
            _ => None,
        }
    }

    /// Public key as the runtime expects it in `register_deal_order`'s `borrower_key`.
    pub fn multi_signer(&self) -> MultiSigner {
        match self {
            Self::Sr25519(signer) => signer.signer().public().into(),
            Self::ECDSA(signer) => signer.signer().public().into(),
            Self::Ed25519(signer) => signer.signer().public().into(),
        }
    }

    /// The ECDSA pair, needed for ownership proofs and legacy wallet claims.
    pub fn ecdsa_pair(&self) -> Option<&ECDSAPair> {
        match self {
            Self::ECDSA(signer) => Some(signer.signer()),
            _ => None,
        }
    }
}

impl Debug for MultiPairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sr25519(arg0) => f.debug_tuple("Sr25519").field(arg0.account_id()).finish(),
            Self::ECDSA(arg0) => f.debug_tuple("ECDSA").field(arg0.account_id()).finish(),
            Self::Ed25519(arg0) => f.debug_tuple("Ed25519").field(arg0.account_id()).finish(),
        }
    }
}

impl subxt::tx::Signer<CreditcoinConfig> for MultiPairSigner {
    fn account_id(&self) -> <CreditcoinConfig as subxt::Config>::AccountId {
        match self {
            Self::Sr25519(signer) => subxt::tx::Signer::account_id(signer),
            Self::ECDSA(signer) => subxt::tx::Signer::account_id(signer),
            Self::Ed25519(signer) => subxt::tx::Signer::account_id(signer),
        }
    }

    fn address(&self) -> <CreditcoinConfig as subxt::Config>::Address {
        match self {
            Self::Sr25519(signer) => subxt::tx::Signer::address(signer),
            Self::ECDSA(signer) => subxt::tx::Signer::address(signer),
            Self::Ed25519(signer) => subxt::tx::Signer::address(signer),
        }
    }

    fn sign(&self, signer_payload: &[u8]) -> <CreditcoinConfig as subxt::Config>::Signature {
        match self {
            Self::Sr25519(signer) => subxt::tx::Signer::sign(signer, signer_payload),
            Self::ECDSA(signer) => subxt::tx::Signer::sign(signer, signer_payload),
            Self::Ed25519(signer) => subxt::tx::Signer::sign(signer, signer_payload),
        }
    }
}

/// Keypair with a [`Debug`] impl that only shows the SS58 address, as `clap` needs one.
#[derive(Clone, PartialEq, Eq)]
pub struct DebugPair<P>(pub(crate) P)
where
    P: Pair;

impl<P> Debug for DebugPair<P>
where
    P: Pair,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DebugPair")
            .field(&self.0.public().to_ss58check())
            .finish()
    }
}

impl<P> DebugPair<P>
where
    P: Pair,
{
    /// Parse a hex seed, a BIP-39 phrase or a dev phrase such as `//Alice`.
    // Kept outside the `clap` module so it is always tested
    #[cfg(any(feature = "clap", test))]
    pub fn value_parser(src: &str) -> Result<Self, String> {
        P::from_string(src, None)
            .map(Self)
            .map_err(|err| format!("failed to parse pair from string: {:?}", err))
    }

    pub fn into_inner(self) -> P {
        self.0
    }
}

#[cfg(feature = "clap")]
mod clap {
    use super::{DebugPair, ECDSAPair, Ed25519Pair, MultiPairSigner, Sr25519Pair};

    #[derive(Debug, Clone, clap::Args)]
    pub struct MultiPairArgs {
        /// Sr25519 keypair, encoded as hex, BIP-39 or a dev phrase like `//Alice`.
        #[arg(long, env = "SR25519_KEY", value_parser = DebugPair::<Sr25519Pair>::value_parser)]
        pub sr25519_key: Option<DebugPair<Sr25519Pair>>,

        /// ECDSA keypair, encoded as hex, BIP-39 or a dev phrase like `//Alice`.
        #[arg(long, env = "ECDSA_KEY", value_parser = DebugPair::<ECDSAPair>::value_parser)]
        pub ecdsa_key: Option<DebugPair<ECDSAPair>>,

        /// Ed25519 keypair, encoded as hex, BIP-39 or a dev phrase like `//Alice`.
        #[arg(long, env = "ED25519_KEY", value_parser = DebugPair::<Ed25519Pair>::value_parser)]
        pub ed25519_key: Option<DebugPair<Ed25519Pair>>,
    }

    impl From<MultiPairArgs> for Option<MultiPairSigner> {
        fn from(value: MultiPairArgs) -> Self {
            MultiPairSigner::new(
                value.sr25519_key.map(DebugPair::into_inner),
                value.ecdsa_key.map(DebugPair::into_inner),
                value.ed25519_key.map(DebugPair::into_inner),
            )
        }
    }
}

#[cfg(feature = "clap")]
pub use self::clap::*;

#[cfg(test)]
mod test {
    use subxt::tx::Signer;

    use super::*;

    const DEV_PHRASE: &str = "bottom drive obey lake curtain smoke basket hold race lonely fit walk";
    const HEX_SEED: &str = "0xd045270857659c84705fbb367fd9644e5ab9b0c668f37c0bf28c6e72a120dd1f";

    #[track_caller]
    fn assert_debug_pair<P>(s: &str)
    where
        P: Pair,
    {
        let result_pair = DebugPair::<P>::value_parser(s).unwrap();
        let expect_pair = P::from_string(s, None).unwrap();

        assert_eq!(result_pair.0.to_raw_vec(), expect_pair.to_raw_vec());
    }

    #[test]
    fn parses_every_key_format() {
        for src in ["//Alice", DEV_PHRASE, HEX_SEED] {
            assert_debug_pair::<Sr25519Pair>(src);
            assert_debug_pair::<ECDSAPair>(src);
            assert_debug_pair::<Ed25519Pair>(src);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(DebugPair::<Sr25519Pair>::value_parser("0xnothex").is_err());
    }

    #[test]
    fn first_key_wins() {
        let sr25519 = Sr25519Pair::from_string("//Alice", None).unwrap();
        let ecdsa = ECDSAPair::from_string("//Bob", None).unwrap();

        let signer = MultiPairSigner::new(Some(sr25519.clone()), Some(ecdsa.clone()), None).unwrap();
        assert_eq!(signer.multi_signer(), MultiSigner::from(sr25519.public()));
        assert!(signer.ecdsa_pair().is_none());

        let signer = MultiPairSigner::new(None, Some(ecdsa.clone()), None).unwrap();
        assert_eq!(signer.ecdsa_pair().map(Pair::public), Some(ecdsa.public()));

        assert!(MultiPairSigner::new(None, None, None).is_none());
    }

    #[test]
    fn account_matches_the_wrapped_signer() {
        let pair = Ed25519Pair::from_string("//Charlie", None).unwrap();
        let signer = MultiPairSigner::new(None, None, Some(pair.clone())).unwrap();

        assert_eq!(
            signer.account_id(),
            PairSigner::<CreditcoinConfig, _>::new(pair).account_id().clone()
        );
    }
}
