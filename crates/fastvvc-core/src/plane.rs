//! Read-only views over the codec data plane
//!
//! The feature extractor reads three picture-wide resources populated by
//! the encoder's pre-analysis pass: the original luma plane, the 4x4-block
//! motion-vector field and the 4x4-block SAD error map. All three are
//! borrowed; the controller never mutates the data plane.

use crate::area::CuArea;

/// Luma sample type (8/10/12-bit content stored in 16 bits)
pub type Pel = i16;

/// Granularity of the MV field and SAD map in luma samples
pub const MV_GRID: u32 = 4;

/// Motion vector in quarter-pel units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mv {
    pub hor: i16,
    pub ver: i16,
}

impl Mv {
    pub fn new(hor: i16, ver: i16) -> Self {
        Self { hor, ver }
    }
}

/// Borrowed view of a sample plane with an explicit stride
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    data: &'a [Pel],
    stride: usize,
    width: u32,
    height: u32,
}

impl<'a> PlaneView<'a> {
    /// Wrap a sample buffer. `data` must cover `height` rows of `stride`
    /// samples with at least `width` valid samples per row.
    pub fn new(data: &'a [Pel], stride: usize, width: u32, height: u32) -> Self {
        debug_assert!(stride >= width as usize);
        debug_assert!(data.len() >= stride * height as usize);
        Self {
            data,
            stride,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample at picture position (x, y)
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> Pel {
        self.data[y as usize * self.stride + x as usize]
    }
}

/// Borrowed view of the picture-wide 4x4 motion-vector field
#[derive(Debug, Clone, Copy)]
pub struct MvFieldView<'a> {
    mvs: &'a [Mv],
    blocks_per_row: usize,
}

impl<'a> MvFieldView<'a> {
    /// `blocks_per_row` is `pic_width / 4`
    pub fn new(mvs: &'a [Mv], blocks_per_row: usize) -> Self {
        Self {
            mvs,
            blocks_per_row,
        }
    }

    /// Motion vector of the 4x4 block containing luma position (x, y)
    #[inline]
    pub fn at_luma(&self, x: u32, y: u32) -> Mv {
        self.mvs[(y / MV_GRID) as usize * self.blocks_per_row + (x / MV_GRID) as usize]
    }
}

/// Borrowed view of the picture-wide 4x4 SAD error map
#[derive(Debug, Clone, Copy)]
pub struct SadMapView<'a> {
    sads: &'a [u32],
    blocks_per_row: usize,
}

impl<'a> SadMapView<'a> {
    pub fn new(sads: &'a [u32], blocks_per_row: usize) -> Self {
        Self {
            sads,
            blocks_per_row,
        }
    }

    /// SAD of the 4x4 block containing luma position (x, y)
    #[inline]
    pub fn at_luma(&self, x: u32, y: u32) -> u32 {
        self.sads[(y / MV_GRID) as usize * self.blocks_per_row + (x / MV_GRID) as usize]
    }
}

/// The complete read-only data plane of the picture under encode
#[derive(Debug, Clone, Copy)]
pub struct PictureView<'a> {
    pub luma: PlaneView<'a>,
    pub mv: MvFieldView<'a>,
    pub sad: SadMapView<'a>,
    /// Picture width in luma samples
    pub width: u32,
    /// Picture height in luma samples
    pub height: u32,
    /// Picture order count
    pub poc: i32,
    /// Temporal sublayer of the picture
    pub temporal_layer: u32,
}

impl<'a> PictureView<'a> {
    /// The CU lies entirely inside the picture
    pub fn covers(&self, area: &CuArea) -> bool {
        area.fits_within(self.width, self.height)
    }
}

/// Owned picture buffers, mainly for drivers and tests
///
/// Holds a luma plane plus zero-initialized MV/SAD grids and hands out a
/// borrowed [`PictureView`].
#[derive(Debug, Clone)]
pub struct PictureBuffers {
    pub width: u32,
    pub height: u32,
    pub poc: i32,
    pub temporal_layer: u32,
    pub luma: Vec<Pel>,
    pub mvs: Vec<Mv>,
    pub sads: Vec<u32>,
}

impl PictureBuffers {
    /// Flat picture filled with a constant luma value, zero MVs, zero SAD
    pub fn flat(width: u32, height: u32, value: Pel) -> Self {
        let blocks = (width / MV_GRID * height / MV_GRID) as usize;
        Self {
            width,
            height,
            poc: 0,
            temporal_layer: 0,
            luma: vec![value; (width * height) as usize],
            mvs: vec![Mv::default(); blocks],
            sads: vec![0; blocks],
        }
    }

    /// Fill luma from a generator over (x, y)
    pub fn fill_luma(&mut self, f: impl Fn(u32, u32) -> Pel) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.luma[(y * self.width + x) as usize] = f(x, y);
            }
        }
    }

    /// Fill the MV field from a generator over 4x4 block coordinates
    pub fn fill_mvs(&mut self, f: impl Fn(u32, u32) -> Mv) {
        let bw = self.width / MV_GRID;
        let bh = self.height / MV_GRID;
        for by in 0..bh {
            for bx in 0..bw {
                self.mvs[(by * bw + bx) as usize] = f(bx, by);
            }
        }
    }

    /// Fill the SAD map from a generator over 4x4 block coordinates
    pub fn fill_sads(&mut self, f: impl Fn(u32, u32) -> u32) {
        let bw = self.width / MV_GRID;
        let bh = self.height / MV_GRID;
        for by in 0..bh {
            for bx in 0..bw {
                self.sads[(by * bw + bx) as usize] = f(bx, by);
            }
        }
    }

    pub fn view(&self) -> PictureView<'_> {
        PictureView {
            luma: PlaneView::new(&self.luma, self.width as usize, self.width, self.height),
            mv: MvFieldView::new(&self.mvs, (self.width / MV_GRID) as usize),
            sad: SadMapView::new(&self.sads, (self.width / MV_GRID) as usize),
            width: self.width,
            height: self.height,
            poc: self.poc,
            temporal_layer: self.temporal_layer,
        }
    }
}
