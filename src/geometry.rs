use serde::Deserialize;

/// How lines are grouped into sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
pub enum Organization {
    #[serde(rename = "direct-mapped", alias = "direct")]
    Direct,
    #[default]
    #[serde(rename = "set-associative", alias = "set")]
    SetAssociative,
    #[serde(rename = "fully-associative", alias = "fully")]
    FullyAssociative,
}

impl std::fmt::Display for Organization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Organization::Direct => f.write_str("direct-mapped"),
            Organization::SetAssociative => f.write_str("set-associative"),
            Organization::FullyAssociative => f.write_str("fully-associative"),
        }
    }
}

/// Shape of the cache. All fields are expected to be at least 1,
/// the configuration boundary normalizes them before they get here.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheGeometry {
    pub total_lines: usize,
    pub block_size: usize,
    pub associativity: usize,
    pub organization: Organization,
}

impl CacheGeometry {
    pub fn num_sets(&self) -> usize {
        match self.organization {
            Organization::Direct => self.total_lines.max(1),
            Organization::SetAssociative => {
                (self.total_lines / self.associativity.max(1)).max(1)
            }
            Organization::FullyAssociative => 1,
        }
    }

    /// number of lines in every set
    pub fn ways(&self) -> usize {
        match self.organization {
            Organization::Direct => 1,
            Organization::SetAssociative => self.associativity.max(1),
            Organization::FullyAssociative => self.total_lines.max(1),
        }
    }

    pub fn offset_bits(&self) -> u32 {
        self.block_size.max(1).ilog2()
    }

    pub fn index_bits(&self) -> u32 {
        self.num_sets().ilog2()
    }

    pub fn format_info(&self) -> String {
        [
            format!("Cache ({}):", self.organization),
            format!("\tLines: {}", self.num_sets() * self.ways()),
            format!("\tSets: {}", self.num_sets()),
            format!("\tWays: {}", self.ways()),
            format!("\tBlock-Size: {}B", self.block_size),
            format!(
                "\t| {} index bits | {} offset bits |",
                self.index_bits(),
                self.offset_bits()
            ),
        ]
        .join("\n")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub tag: usize,
    pub set_index: usize,
    pub offset: usize,
}

/// Splits addresses into tag, set index and offset for one geometry.
#[derive(Debug, Copy, Clone)]
pub struct AddressDecoder {
    offset_width: u32,
    set_index_width: u32,
    set_index_mask: usize,
    offset_mask: usize,
    fully_associative: bool,
}

impl AddressDecoder {
    pub fn new(geometry: &CacheGeometry) -> Self {
        let offset_width = geometry.offset_bits();
        let set_index_width = geometry.index_bits();

        Self {
            offset_width,
            set_index_width,
            set_index_mask: !(!0usize << set_index_width),
            offset_mask: !(!0usize << offset_width),
            fully_associative: geometry.organization == Organization::FullyAssociative,
        }
    }

    pub fn decode(&self, address: usize) -> DecodedAddress {
        let index = (address >> self.offset_width) & self.set_index_mask;
        let tag = address
            .checked_shr(self.offset_width + self.set_index_width)
            .unwrap_or(0);

        DecodedAddress {
            tag,
            set_index: if self.fully_associative { 0 } else { index },
            offset: address & self.offset_mask,
        }
    }
}

/// Shorthand for a one-off decode.
pub fn decode(address: usize, geometry: &CacheGeometry) -> DecodedAddress {
    AddressDecoder::new(geometry).decode(address)
}

/// Bit widths used to show an address split into its fields.
///
/// The tag field is sized to the largest address that will be shown
/// rather than to a fixed total address width.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressLayout {
    pub tag_bits: u32,
    pub index_bits: u32,
    pub offset_bits: u32,
}

impl AddressLayout {
    pub fn for_geometry(geometry: &CacheGeometry, max_address: usize) -> Self {
        let offset_bits = geometry.offset_bits();
        let index_bits = geometry.index_bits();
        let address_bits = usize::BITS - max_address.leading_zeros();
        let tag_bits = address_bits.saturating_sub(offset_bits + index_bits).max(1);

        Self {
            tag_bits,
            index_bits,
            offset_bits,
        }
    }

    pub fn total_bits(&self) -> u32 {
        self.tag_bits + self.index_bits + self.offset_bits
    }

    /// `tag|index|offset` in binary, empty fields are left empty
    pub fn format(&self, address: usize) -> String {
        let width = self.total_bits() as usize;
        let bin = format!("{address:0width$b}");
        // keep the low bits if the address is wider than the layout
        let bin = &bin[bin.len() - width..];

        let (tag, rest) = bin.split_at(self.tag_bits as usize);
        let (index, offset) = rest.split_at(self.index_bits as usize);
        format!("{tag}|{index}|{offset}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn geometry(
        total_lines: usize,
        block_size: usize,
        associativity: usize,
        organization: Organization,
    ) -> CacheGeometry {
        CacheGeometry {
            total_lines,
            block_size,
            associativity,
            organization,
        }
    }

    #[test]
    fn set_counts() {
        let direct = geometry(4, 1, 3, Organization::Direct);
        assert_eq!((direct.num_sets(), direct.ways()), (4, 1));

        let set = geometry(8, 1, 2, Organization::SetAssociative);
        assert_eq!((set.num_sets(), set.ways()), (4, 2));
        assert_eq!(set.num_sets() * set.ways(), set.total_lines);

        let fully = geometry(8, 1, 2, Organization::FullyAssociative);
        assert_eq!((fully.num_sets(), fully.ways()), (1, 8));

        // more ways than lines still gives one set
        let wide = geometry(2, 1, 4, Organization::SetAssociative);
        assert_eq!((wide.num_sets(), wide.ways()), (1, 4));

        // floor division
        let odd = geometry(10, 1, 4, Organization::SetAssociative);
        assert_eq!(odd.num_sets(), 2);
    }

    #[test]
    fn bit_widths() {
        let g = geometry(16, 4, 2, Organization::SetAssociative);
        assert_eq!(g.offset_bits(), 2);
        assert_eq!(g.index_bits(), 3);

        // non power of two rounds down
        let g = geometry(12, 6, 1, Organization::Direct);
        assert_eq!(g.offset_bits(), 2);
        assert_eq!(g.index_bits(), 3);

        let g = geometry(1, 1, 1, Organization::Direct);
        assert_eq!((g.offset_bits(), g.index_bits()), (0, 0));
    }

    #[test]
    fn decode_fields() {
        // 4 sets, 4 byte blocks: | tag | 2 index bits | 2 offset bits |
        let g = geometry(8, 4, 2, Organization::SetAssociative);
        let decoded = decode(0b1101_10_11, &g);
        assert_eq!(
            decoded,
            DecodedAddress {
                tag: 0b1101,
                set_index: 0b10,
                offset: 0b11
            }
        );
    }

    #[test]
    fn direct_mapped_index_is_address_mod_lines() {
        let g = geometry(4, 1, 1, Organization::Direct);
        for address in [0, 4, 8] {
            assert_eq!(decode(address, &g).set_index, 0);
        }
        assert_eq!(decode(7, &g).set_index, 3);
        assert_eq!(decode(7, &g).tag, 1);
    }

    #[test]
    fn fully_associative_uses_single_set() {
        let g = geometry(4, 2, 1, Organization::FullyAssociative);
        let decoded = decode(0b1011, &g);
        assert_eq!(decoded.set_index, 0);
        assert_eq!(decoded.tag, 0b101);
        assert_eq!(decoded.offset, 1);
    }

    #[test]
    fn address_layout_sized_to_geometry() {
        let g = geometry(4, 2, 1, Organization::Direct);
        let layout = AddressLayout::for_geometry(&g, 127);
        assert_eq!(
            layout,
            AddressLayout {
                tag_bits: 4,
                index_bits: 2,
                offset_bits: 1
            }
        );
        assert_eq!(layout.format(0b1010_11_1), "1010|11|1");

        // small addresses still get one tag bit
        let layout = AddressLayout::for_geometry(&g, 3);
        assert_eq!(layout.tag_bits, 1);
        assert_eq!(layout.format(3), "0|01|1");

        // wide addresses are not cut off at 8 bits
        let layout = AddressLayout::for_geometry(&g, 0x1000);
        assert_eq!(layout.total_bits(), 13);
    }

    #[test]
    fn address_layout_empty_fields() {
        let g = geometry(4, 1, 1, Organization::FullyAssociative);
        let layout = AddressLayout::for_geometry(&g, 5);
        assert_eq!(layout.format(5), "101||");
    }
}
