//! Chain head shape shared by the Prysm `v1alpha1` API and the pre-standard Teku REST API.

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use types::phase0::{
    containers::ChainHeadSnapshot,
    primitives::{Epoch, Root, RootError, Slot},
};

#[derive(Clone, Copy)]
pub enum RootEncoding {
    Base64,
    Hex,
}

impl RootEncoding {
    pub fn decode(self, string: &str) -> Result<Root, RootError> {
        match self {
            Self::Base64 => Root::from_base64(string),
            Self::Hex => Root::from_hex(string),
        }
    }
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyChainHead {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    head_slot: Slot,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    head_epoch: Epoch,
    #[serde(default)]
    head_block_root: Option<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    justified_slot: Slot,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    justified_epoch: Epoch,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    finalized_slot: Slot,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    finalized_epoch: Epoch,
}

impl LegacyChainHead {
    pub fn into_snapshot(self, encoding: RootEncoding) -> Result<ChainHeadSnapshot, RootError> {
        let head_block_root = self
            .head_block_root
            .as_deref()
            .filter(|root| !root.is_empty())
            .map(|root| encoding.decode(root))
            .transpose()?;

        Ok(ChainHeadSnapshot {
            head_slot: self.head_slot,
            head_epoch: self.head_epoch,
            head_block_root,
            justified_slot: self.justified_slot,
            justified_epoch: self.justified_epoch,
            finalized_slot: self.finalized_slot,
            finalized_epoch: self.finalized_epoch,
        })
    }
}
