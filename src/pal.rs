use crate::error::Error;
use arrayvec::ArrayVec;
use std::fmt;

/// 8-bit RGBA in sRGB. This is the only pixel format consumed by the library.
pub type RGBA = rgb::RGBA<u8>;

/// 8-bit RGB of a palette entry.
pub type RGB = rgb::RGB<u8>;

/// Index into a [`Palette`]
pub type PalIndex = u8;

/// Palettes are stored inline, and the drawing surfaces this targets expose
/// only a small fixed set of selectable colors anyway.
pub(crate) const MAX_COLORS: usize = 32;

/// Number of entries per palette row (light row + dark row)
pub(crate) const ROW_LEN: usize = 13;

/// One selectable color of the drawing surface
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PaletteEntry {
    /// Human-readable name, e.g. `"sky blue"`
    pub name: &'static str,
    /// The exact color the surface paints with
    pub rgb: RGB,
}

impl PaletteEntry {
    /// Canonical string identity exchanged with the drawing surface,
    /// formatted as `rgb(r, g, b)`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("rgb({}, {}, {})", self.rgb.r, self.rgb.g, self.rgb.b)
    }
}

/// Fixed, ordered, closed set of selectable colors.
///
/// The builtin palette has two rows of 13: a light row starting with white
/// and a dark row starting with black, 26 entries total. Entry order matters:
/// nearest-color ties resolve to the earlier entry.
#[derive(Clone)]
pub struct Palette {
    entries: ArrayVec<PaletteEntry, MAX_COLORS>,
}

const fn e(name: &'static str, r: u8, g: u8, b: u8) -> PaletteEntry {
    PaletteEntry { name, rgb: RGB { r, g, b } }
}

/// Light row followed by dark row, in toolbar order. White is first, so it is
/// the fallback background for empty images.
static BUILTIN: [PaletteEntry; ROW_LEN * 2] = [
    e("white", 255, 255, 255),
    e("light gray", 193, 193, 193),
    e("red", 239, 19, 11),
    e("orange", 255, 113, 0),
    e("yellow", 255, 228, 0),
    e("green", 0, 204, 0),
    e("mint", 0, 255, 145),
    e("sky blue", 0, 178, 255),
    e("navy", 35, 31, 211),
    e("purple", 163, 0, 186),
    e("pink", 223, 105, 167),
    e("beige", 255, 172, 142),
    e("brown", 160, 82, 45),
    e("black", 0, 0, 0),
    e("gray", 80, 80, 80),
    e("dark red", 116, 11, 7),
    e("dark orange", 194, 56, 0),
    e("dark yellow", 232, 162, 0),
    e("dark green", 0, 70, 25),
    e("dark mint", 0, 120, 93),
    e("dark sky blue", 0, 86, 158),
    e("dark navy", 14, 8, 101),
    e("dark purple", 85, 0, 105),
    e("dark pink", 135, 53, 84),
    e("dark beige", 204, 119, 77),
    e("dark brown", 99, 48, 13),
];

impl Palette {
    /// The 26-color light/dark palette of the reference drawing surface
    #[must_use]
    pub fn builtin() -> Self {
        Self { entries: BUILTIN.iter().copied().collect() }
    }

    /// A custom closed palette. Entry 0 doubles as the fallback background
    /// color for fully transparent images.
    pub fn new(entries: &[PaletteEntry]) -> Result<Self, Error> {
        if entries.is_empty() || entries.len() > MAX_COLORS {
            return Err(Error::ValueOutOfRange);
        }
        Ok(Self { entries: entries.iter().copied().collect() })
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline(always)]
    #[must_use]
    pub fn as_slice(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Panics if the index is out of range. Indices produced by this crate
    /// are always valid for the palette they came from.
    #[inline]
    #[must_use]
    pub fn entry(&self, idx: PalIndex) -> &PaletteEntry {
        &self.entries[usize::from(idx)]
    }

    /// Background used when the image has no opaque pixels at all.
    /// White in the builtin palette.
    #[inline(always)]
    #[must_use]
    pub(crate) fn fallback_background(&self) -> PalIndex {
        0
    }

    /// Index of the entry whose color minimizes Euclidean RGB distance.
    ///
    /// Squared distance compares the same as the square root. Ties keep the
    /// first entry in palette order, which is deterministic but carries no
    /// meaning beyond that.
    #[must_use]
    pub fn nearest(&self, color: RGB) -> PalIndex {
        let mut best = 0;
        let mut best_dist = u32::MAX;
        for (idx, entry) in self.entries.iter().enumerate() {
            let d = dist_sq(color, entry.rgb);
            if d < best_dist {
                best_dist = d;
                best = idx;
            }
        }
        best as PalIndex
    }

    /// Resolve a canonical `rgb(r, g, b)` key back to a palette index.
    /// Returns `None` for keys naming no entry, which callers treat as a
    /// silently skipped selection.
    #[must_use]
    pub fn index_of_key(&self, key: &str) -> Option<PalIndex> {
        let rgb = parse_key(key)?;
        self.entries.iter().position(|entry| entry.rgb == rgb).map(|i| i as PalIndex)
    }
}

#[inline]
fn dist_sq(a: RGB, b: RGB) -> u32 {
    let dr = i32::from(a.r) - i32::from(b.r);
    let dg = i32::from(a.g) - i32::from(b.g);
    let db = i32::from(a.b) - i32::from(b.b);
    (dr * dr + dg * dg + db * db) as u32
}

/// Pulls the first three integers out of a key string, accepting the same
/// inputs the reference surface produced (`"rgb(255, 0, 128)"`).
fn parse_key(key: &str) -> Option<RGB> {
    let mut nums = key
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(str::parse::<u8>);
    let r = nums.next()?.ok()?;
    let g = nums.next()?.ok()?;
    let b = nums.next()?.ok()?;
    Some(RGB { r, g, b })
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Palette").field("len", &self.entries.len()).finish()
    }
}

impl Default for Palette {
    #[inline(always)]
    fn default() -> Self {
        Self::builtin()
    }
}

#[test]
fn builtin_shape() {
    let pal = Palette::builtin();
    assert_eq!(pal.len(), 26);
    assert_eq!(pal.entry(0).name, "white");
    assert_eq!(pal.entry(13).name, "black");
    assert_eq!(pal.entry(0).key(), "rgb(255, 255, 255)");
    assert_eq!(pal.fallback_background(), 0);
}

#[test]
fn nearest_exact_and_tie() {
    let pal = Palette::builtin();
    for (idx, entry) in pal.as_slice().iter().enumerate() {
        assert_eq!(pal.nearest(entry.rgb), idx as PalIndex, "{}", entry.name);
    }

    // equidistant from both entries; the first must win
    let two = Palette::new(&[e("a", 0, 0, 0), e("b", 0, 0, 2)]).unwrap();
    assert_eq!(two.nearest(RGB { r: 0, g: 0, b: 1 }), 0);
}

#[test]
fn key_roundtrip() {
    let pal = Palette::builtin();
    for (idx, entry) in pal.as_slice().iter().enumerate() {
        assert_eq!(pal.index_of_key(&entry.key()), Some(idx as PalIndex));
    }
    assert_eq!(pal.index_of_key("rgb(1, 2, 3)"), None);
    assert_eq!(pal.index_of_key("not a key"), None);
    assert_eq!(pal.index_of_key("rgb(999, 0, 0)"), None);
}

#[test]
fn palette_limits() {
    assert!(Palette::new(&[]).is_err());
    let many = [e("x", 1, 1, 1); MAX_COLORS + 1];
    assert!(Palette::new(&many).is_err());
    assert!(Palette::new(&many[..MAX_COLORS]).is_ok());
}
