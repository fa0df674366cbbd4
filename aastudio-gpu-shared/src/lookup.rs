//! Precomputed SMAA lookup textures (area and search).
//!
//! Both tables are compiled into the crate from `smaa/*.raw` as raw rows, top
//! row first. `tools/smaa_lookup.py` regenerates them. Their dimensions are
//! fixed by the data and never follow the viewport.

pub const AREATEX_WIDTH: u32 = 160;
pub const AREATEX_HEIGHT: u32 = 560;
pub const AREATEX_PITCH: u32 = AREATEX_WIDTH * 2;
pub const AREATEX_SIZE: usize = (AREATEX_HEIGHT * AREATEX_PITCH) as usize;

pub const SEARCHTEX_WIDTH: u32 = 64;
pub const SEARCHTEX_HEIGHT: u32 = 16;
pub const SEARCHTEX_PITCH: u32 = SEARCHTEX_WIDTH;
pub const SEARCHTEX_SIZE: usize = (SEARCHTEX_HEIGHT * SEARCHTEX_PITCH) as usize;

/// RG8 area table: orthogonal areas in the left half, diagonal in the right.
pub const AREATEX_BYTES: &[u8] = include_bytes!("../smaa/AreaTex.raw");
/// R8 search table: 0, 127 or 254 per texel.
pub const SEARCHTEX_BYTES: &[u8] = include_bytes!("../smaa/SearchTex.raw");

const _: () = assert!(AREATEX_BYTES.len() == AREATEX_SIZE);
const _: () = assert!(SEARCHTEX_BYTES.len() == SEARCHTEX_SIZE);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Area,
    Search,
}

impl LookupKind {
    pub fn width(self) -> u32 {
        match self {
            LookupKind::Area => AREATEX_WIDTH,
            LookupKind::Search => SEARCHTEX_WIDTH,
        }
    }

    pub fn height(self) -> u32 {
        match self {
            LookupKind::Area => AREATEX_HEIGHT,
            LookupKind::Search => SEARCHTEX_HEIGHT,
        }
    }

    /// Bytes per row.
    pub fn pitch(self) -> u32 {
        match self {
            LookupKind::Area => AREATEX_PITCH,
            LookupKind::Search => SEARCHTEX_PITCH,
        }
    }

    pub fn channels(self) -> u32 {
        self.pitch() / self.width()
    }
}

/// One lookup table ready for upload.
#[derive(Debug, Clone, Copy)]
pub struct LookupTexture {
    pub kind: LookupKind,
    pub bytes: &'static [u8],
}

impl LookupTexture {
    pub const fn area() -> Self {
        Self {
            kind: LookupKind::Area,
            bytes: AREATEX_BYTES,
        }
    }

    pub const fn search() -> Self {
        Self {
            kind: LookupKind::Search,
            bytes: SEARCHTEX_BYTES,
        }
    }

    pub fn width(&self) -> u32 {
        self.kind.width()
    }

    pub fn height(&self) -> u32 {
        self.kind.height()
    }

    pub fn pitch(&self) -> u32 {
        self.kind.pitch()
    }
}

/// Area and search tables, uploaded together at startup.
#[derive(Debug, Clone, Copy)]
pub struct SmaaLookup {
    pub area: LookupTexture,
    pub search: LookupTexture,
}

impl SmaaLookup {
    pub const fn bundled() -> Self {
        Self {
            area: LookupTexture::area(),
            search: LookupTexture::search(),
        }
    }
}

impl Default for SmaaLookup {
    fn default() -> Self {
        Self::bundled()
    }
}
