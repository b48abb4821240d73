//! Which varieties each block's field form offers.
//!
//! The catalog is advisory: intake never rejects a variety because it is
//! missing here. It only feeds the form-options query.
use serde::Serialize;

use crate::rules::SizeRulebook;
use crate::size::SizeCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VarietyOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn v(value: &'static str, label: &'static str) -> VarietyOption {
    VarietyOption { value, label }
}

#[derive(Debug, Clone, Copy)]
struct BlockEntry {
    blocks: &'static [&'static str],
    varieties: &'static [VarietyOption],
}

const FIELD_BLOCKS: &[BlockEntry] = &[
    BlockEntry {
        blocks: &["1"],
        varieties: &[v("vendela", "Vendela"), v("pink floyd", "Pink Floyd")],
    },
    BlockEntry {
        blocks: &["2"],
        varieties: &[v("coral reff", "Coral Reff"), v("hummer", "Hummer")],
    },
    BlockEntry {
        blocks: &["3"],
        varieties: &[
            v("momentum", "Momentum"),
            v("quick sand", "Quick Sand"),
            v("pink floyd", "Pink Floyd"),
            v("freedom", "Freedom"),
        ],
    },
    BlockEntry {
        blocks: &["4"],
        varieties: &[v("freedom", "Freedom"), v("hilux", "Hilux")],
    },
    BlockEntry {
        blocks: &["5", "6", "9", "13"],
        varieties: &[v("freedom", "Freedom")],
    },
    BlockEntry {
        blocks: &["7"],
        varieties: &[v("candlelight", "Candlelight"), v("deep purple", "Deep Purple")],
    },
    BlockEntry {
        blocks: &["8"],
        varieties: &[
            v("star platinum", "Star Platinum"),
            v("candlelight", "Candlelight"),
            v("sommersand", "Sommersand"),
            v("freedom", "Freedom"),
        ],
    },
    BlockEntry {
        blocks: &["10"],
        varieties: &[v("shimmer", "Shimmer"), v("freedom", "Freedom")],
    },
    BlockEntry {
        blocks: &["11"],
        varieties: &[
            v("pink mondial", "Pink Mondial"),
            v("whithe ohora", "Whithe Ohora"),
            v("pink ohora", "Pink Ohora"),
            v("mondial", "Mondial"),
        ],
    },
    BlockEntry {
        blocks: &["12"],
        varieties: &[
            v("mondial", "Mondial"),
            v("blessing", "Blessing"),
            v("pink amareto", "Pink Amareto"),
            v("sommersand", "Sommersand"),
        ],
    },
];

/// Block → offered varieties, as printed on the QR-linked field forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarietyCatalog;

impl VarietyCatalog {
    pub fn standard() -> Self {
        VarietyCatalog
    }

    /// Varieties offered for `block`; empty for blocks the farm does not have.
    pub fn varieties_for(&self, block: &str) -> &'static [VarietyOption] {
        let block = block.trim();
        FIELD_BLOCKS
            .iter()
            .find(|entry| entry.blocks.contains(&block))
            .map(|entry| entry.varieties)
            .unwrap_or(&[])
    }

    /// Pre-selected variety for the block's form (the first one listed).
    pub fn default_variety(&self, block: &str) -> Option<&'static str> {
        self.varieties_for(block).first().map(|option| option.value)
    }

    /// Every block the catalog knows, in ascending numeric order.
    pub fn blocks(&self) -> Vec<&'static str> {
        let mut blocks: Vec<_> = FIELD_BLOCKS
            .iter()
            .flat_map(|entry| entry.blocks.iter().copied())
            .collect();
        blocks.sort_by_key(|b| b.parse::<u32>().unwrap_or(u32::MAX));
        blocks
    }

    /// Combines the catalog with the size table for one form.
    ///
    /// `offer_sizes` is `false` for national forms, which never carry a size.
    pub fn form_options(
        &self,
        rules: &SizeRulebook,
        block: &str,
        offer_sizes: bool,
    ) -> FormOptions {
        let block = block.trim();
        let varieties = self
            .varieties_for(block)
            .iter()
            .map(|option| VarietyChoice {
                value: option.value,
                label: option.label,
                sizes: if offer_sizes {
                    rules.offered_sizes(option.value, block).to_vec()
                } else {
                    Vec::new()
                },
            })
            .collect();

        FormOptions {
            block: block.to_string(),
            default_variety: self.default_variety(block),
            varieties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarietyChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub sizes: Vec<SizeCode>,
}

/// What a field form for one block should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormOptions {
    pub block: String,
    pub default_variety: Option<&'static str>,
    pub varieties: Vec<VarietyChoice>,
}
