//! Quadrant-statistics feature extraction
//!
//! The CU is split into four quadrants at `halfW = max(w/2, 4)`,
//! `halfH = max(h/2, 4)`. Pixel-domain statistics (mean/variance,
//! first-order gradients, 3x3 Sobel energy), MV-field statistics
//! (resolution-normalized variances and mean magnitudes) and SAD-map
//! statistics are computed per quadrant and globally, then combined into
//! directional ratio features.
//!
//! MV variances divide by `(picWidth/416)^2` and `(picHeight/240)^2`; the
//! quadrant mean-MV magnitude divides by the width factor only. These
//! factors and every normalizer below are training contracts.

use fastvvc_core::{CuArea, PartitionError, PictureView, PlaneView, Result};
use tracing::trace;

use crate::vectors::{FeatureBundle, NonSplitClass, HOR_VER_DIMS, QT_MTT_DIMS};

/// Per-4x4 grid edge of the largest CU (128 / 4)
const MAX_BLOCKS: usize = 32;

#[derive(Debug, Default, Clone, Copy)]
struct PixQuad {
    sum: f64,
    sq: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct GradQuad {
    hor: f64,
    ver: f64,
    sobel: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct MvQuad {
    sum_x: f64,
    sum_y: f64,
    sq_x: f64,
    sq_y: f64,
    sum_sad: f64,
    sq_sad: f64,
}

/// Squared 3x3 Sobel magnitude at CU-local position (x, y)
#[inline]
fn sobel_sq(luma: &PlaneView<'_>, ox: u32, oy: u32, x: u32, y: u32) -> f64 {
    let p = |dx: i32, dy: i32| -> f64 {
        luma.at(
            (ox as i32 + x as i32 + dx) as u32,
            (oy as i32 + y as i32 + dy) as u32,
        ) as f64
    };
    let x_sum = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
    let y_sum = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
    x_sum * x_sum + y_sum * y_sum
}

fn pixel_quad(
    luma: &PlaneView<'_>,
    ox: u32,
    oy: u32,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
) -> PixQuad {
    let mut q = PixQuad::default();
    for y in ys {
        for x in xs.clone() {
            let p = luma.at(ox + x, oy + y) as f64;
            q.sum += p;
            q.sq += p * p;
        }
    }
    q
}

/// Raw gradient/Sobel accumulation over one quadrant. Pair differences use
/// the in-quadrant loop bounds of the training extractor; pairs crossing
/// the quadrant seams are added by the dedicated seam passes.
fn grad_quad(
    luma: &PlaneView<'_>,
    ox: u32,
    oy: u32,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
) -> GradQuad {
    let mut q = GradQuad::default();
    for y in ys {
        for x in xs.clone() {
            q.hor += (luma.at(ox + x + 1, oy + y) as f64 - luma.at(ox + x, oy + y) as f64).abs();
            q.ver += (luma.at(ox + x, oy + y + 1) as f64 - luma.at(ox + x, oy + y) as f64).abs();
            if x >= 1 && y >= 1 {
                q.sobel += sobel_sq(luma, ox, oy, x, y);
            }
        }
    }
    q
}

/// Extract both classifier vectors for the CU at `area`.
///
/// Fails with `InsufficientArea` when the CU reaches or exceeds the
/// picture bounds, and with `SingularFeatures` when a vertical-gradient
/// denominator vanishes. A zero denominator specific to the Hor-vs-Ver
/// ratios only clears `hor_ver_valid`.
pub fn extract(
    pic: &PictureView<'_>,
    area: &CuArea,
    qp: i32,
    class: NonSplitClass,
) -> Result<FeatureBundle> {
    let w = area.width;
    let h = area.height;
    if area.bottom() >= pic.height || area.right() >= pic.width {
        return Err(PartitionError::insufficient_area(
            *area, pic.width, pic.height,
        ));
    }

    let half_w = (w / 2).max(4);
    let half_h = (h / 2).max(4);
    let quad_n = (half_w * half_h) as f64;
    let (ox, oy) = (area.x, area.y);
    let luma = &pic.luma;

    // ------------------------------------------------------------------
    // Pixel domain: quadrant and global mean/variance
    // ------------------------------------------------------------------
    let px_tl = pixel_quad(luma, ox, oy, 0..half_w, 0..half_h);
    let px_tr = pixel_quad(luma, ox, oy, half_w..w, 0..half_h);
    let px_bl = pixel_quad(luma, ox, oy, 0..half_w, half_h..h);
    let px_br = pixel_quad(luma, ox, oy, half_w..w, half_h..h);

    let quad_var = |q: &PixQuad| -> f64 {
        let ave = q.sum / quad_n;
        q.sq / quad_n - ave * ave
    };
    let var_top_l = quad_var(&px_tl);
    let var_top_r = quad_var(&px_tr);
    let var_bot_l = quad_var(&px_bl);
    let var_bot_r = quad_var(&px_br);

    let total_n = (w * h) as f64;
    let total_sum = px_tl.sum + px_tr.sum + px_bl.sum + px_br.sum;
    let total_sq = px_tl.sq + px_tr.sq + px_bl.sq + px_br.sq;
    let ave = total_sum / total_n;
    let var = total_sq / total_n - ave * ave;

    // ------------------------------------------------------------------
    // Gradients and Sobel energy
    // ------------------------------------------------------------------
    let g_tl = grad_quad(luma, ox, oy, 0..half_w - 1, 0..half_h - 1);
    let g_tr = grad_quad(luma, ox, oy, half_w..w - 1, 0..half_h - 1);
    let g_bl = grad_quad(luma, ox, oy, 0..half_w - 1, half_h..h - 1);
    let g_br = grad_quad(luma, ox, oy, half_w..w - 1, half_h..h - 1);

    let mut grad_hor = g_tl.hor + g_tr.hor + g_bl.hor + g_br.hor;
    let mut grad_ver = g_tl.ver + g_tr.ver + g_bl.ver + g_br.ver;

    // seam column between the left and right halves
    for y in 0..h - 1 {
        grad_hor +=
            (luma.at(ox + half_w, oy + y) as f64 - luma.at(ox + half_w - 1, oy + y) as f64).abs();
    }
    // seam row between the top and bottom halves
    for x in 0..w - 1 {
        grad_ver +=
            (luma.at(ox + x, oy + half_h) as f64 - luma.at(ox + x, oy + half_h - 1) as f64).abs();
    }

    let grad_quad_n = ((half_h - 1) * (half_w - 1)) as f64;
    let sobel_quad_n = ((half_h - 2) * (half_w - 2)) as f64;
    let grad_hor_top_l = g_tl.hor / grad_quad_n;
    let grad_ver_top_l = g_tl.ver / grad_quad_n;
    let grad_hor_top_r = g_tr.hor / grad_quad_n;
    let grad_ver_top_r = g_tr.ver / grad_quad_n;
    let grad_hor_bot_l = g_bl.hor / grad_quad_n;
    let grad_ver_bot_l = g_bl.ver / grad_quad_n;
    let grad_hor_bot_r = g_br.hor / grad_quad_n;
    let grad_ver_bot_r = g_br.ver / grad_quad_n;
    let sobel_top_l = g_tl.sobel / sobel_quad_n;
    let sobel_top_r = g_tr.sobel / sobel_quad_n;
    let sobel_bot_l = g_bl.sobel / sobel_quad_n;
    let sobel_bot_r = g_br.sobel / sobel_quad_n;

    grad_hor /= ((h - 1) * (w - 1)) as f64;
    grad_ver /= ((h - 1) * (w - 1)) as f64;
    let grad_ratio = grad_hor / grad_ver;

    // ------------------------------------------------------------------
    // MV field and SAD map over the 4x4 grid
    // ------------------------------------------------------------------
    let mut mv_x = [[0i32; MAX_BLOCKS]; MAX_BLOCKS];
    let mut mv_y = [[0i32; MAX_BLOCKS]; MAX_BLOCKS];
    let mut sad_err = [[0i64; MAX_BLOCKS]; MAX_BLOCKS];
    let mut g = MvQuad::default();
    let mut squared_mul = 0.0f64;

    for y in (0..h).step_by(4) {
        for x in (0..w).step_by(4) {
            let mv = pic.mv.at_luma(ox + x, oy + y);
            let (bx, by) = (mv.hor as f64, mv.ver as f64);
            g.sum_x += bx;
            g.sq_x += bx * bx;
            g.sum_y += by;
            g.sq_y += by * by;
            mv_x[(y / 4) as usize][(x / 4) as usize] = mv.hor as i32;
            mv_y[(y / 4) as usize][(x / 4) as usize] = mv.ver as i32;

            let sad = pic.sad.at_luma(ox + x, oy + y) as f64;
            g.sum_sad += sad;
            g.sq_sad += sad * sad;
            sad_err[(y / 4) as usize][(x / 4) as usize] = pic.sad.at_luma(ox + x, oy + y) as i64;
            squared_mul += (bx * by) * (bx * by);
        }
    }

    let norm_var = |sq: f64, sum: f64, n: f64| -> f64 {
        (sq * 16.0) / n - ((sum * 16.0) / n) * ((sum * 16.0) / n)
    };

    let var_mv_x = norm_var(g.sq_x, g.sum_x, total_n);
    let var_mv_y = norm_var(g.sq_y, g.sum_y, total_n);
    let var_sad = norm_var(g.sq_sad, g.sum_sad, total_n);
    let ave_sad = (g.sum_sad * 16.0) / quad_n;

    let width_factor = pic.width as f64 / 416.0;
    let height_factor = pic.height as f64 / 240.0;
    let var_mv_scaled =
        var_mv_x / (width_factor * width_factor) + var_mv_y / (height_factor * height_factor);

    let (a, b, d) = (g.sq_x, squared_mul, g.sq_y);
    let eigen_difference = ((a + d) * (a + d) - 4.0 * (a * d - b * b)) / ((a + d) * (a + d));

    // per-quadrant MV/SAD accumulation over the stored grids
    let mv_quad = |ii: std::ops::Range<usize>, jj: std::ops::Range<usize>| -> MvQuad {
        let mut q = MvQuad::default();
        for i in ii {
            for j in jj.clone() {
                let (bx, by) = (mv_x[i][j] as f64, mv_y[i][j] as f64);
                q.sum_x += bx;
                q.sq_x += bx * bx;
                q.sum_y += by;
                q.sq_y += by * by;
                let sad = sad_err[i][j] as f64;
                q.sum_sad += sad;
                q.sq_sad += sad * sad;
            }
        }
        q
    };
    let (hb, wb) = ((half_h / 4) as usize, (half_w / 4) as usize);
    let (hn, wn) = ((h / 4) as usize, (w / 4) as usize);
    let q_tl = mv_quad(0..hb, 0..wb);
    let q_tr = mv_quad(0..hb, wb..wn);
    let q_bl = mv_quad(hb..hn, 0..wb);
    let q_br = mv_quad(hb..hn, wb..wn);

    let quad_mv = |q: &MvQuad| -> (f64, f64, f64, f64) {
        let var_x = norm_var(q.sq_x, q.sum_x, quad_n);
        let var_y = norm_var(q.sq_y, q.sum_y, quad_n);
        let scaled =
            var_x / (width_factor * width_factor) + var_y / (height_factor * height_factor);
        let var_sad_q = norm_var(q.sq_sad, q.sum_sad, quad_n);
        let ave_sad_q = (q.sum_sad * 16.0) / quad_n;
        (scaled, var_sad_q, ave_sad_q, {
            let ave_x = 16.0 * q.sum_x / quad_n;
            let ave_y = 16.0 * q.sum_y / quad_n;
            (ave_x.abs() + ave_y.abs()) / width_factor
        })
    };
    let (var_mv_top_l_scaled, var_sad_top_l, ave_sad_top_l, ave_mv_top_l_scaled) = quad_mv(&q_tl);
    let (var_mv_top_r_scaled, var_sad_top_r, ave_sad_top_r, ave_mv_top_r_scaled) = quad_mv(&q_tr);
    let (var_mv_bot_l_scaled, var_sad_bot_l, ave_sad_bot_l, ave_mv_bot_l_scaled) = quad_mv(&q_bl);
    let (var_mv_bot_r_scaled, var_sad_bot_r, ave_sad_bot_r, ave_mv_bot_r_scaled) = quad_mv(&q_br);
    let ave_mv_scaled = (ave_mv_top_l_scaled
        + ave_mv_top_r_scaled
        + ave_mv_bot_l_scaled
        + ave_mv_bot_r_scaled)
        / 4.0;

    // ------------------------------------------------------------------
    // Directional ratio features over pooled half-block statistics
    // ------------------------------------------------------------------
    let pooled_var = |sq1: f64, sq2: f64, s1: f64, s2: f64| -> f64 {
        let m = 8.0 * (s1 + s2) / quad_n;
        8.0 * (sq1 + sq2) / quad_n - m * m
    };

    let ratio2_h_var_pix = (pooled_var(px_tl.sq, px_bl.sq, px_tl.sum, px_bl.sum)
        / pooled_var(px_tr.sq, px_br.sq, px_tr.sum, px_br.sum))
    .abs();
    let ratio2_v_var_pix = (pooled_var(px_tl.sq, px_tr.sq, px_tl.sum, px_tr.sum)
        / pooled_var(px_bl.sq, px_br.sq, px_bl.sum, px_br.sum))
    .abs();

    let ratio2_h_grad = (grad_hor_top_l / grad_ver_top_l + grad_hor_bot_l / grad_ver_bot_l).abs()
        / (grad_hor_top_r / grad_ver_top_r + grad_hor_bot_r / grad_ver_bot_r).abs();
    let ratio2_v_grad = (grad_hor_top_l / grad_ver_top_l + grad_hor_top_r / grad_ver_top_r).abs()
        / (grad_hor_bot_l / grad_ver_bot_l + grad_hor_bot_r / grad_ver_bot_r).abs();

    let ratio2_h_var_mv_scaled = (pooled_var(q_tl.sq_x, q_bl.sq_x, q_tl.sum_x, q_bl.sum_x)
        / pooled_var(q_tr.sq_x, q_br.sq_x, q_tr.sum_x, q_br.sum_x))
    .abs()
        + (pooled_var(q_tl.sq_y, q_bl.sq_y, q_tl.sum_y, q_bl.sum_y)
            / pooled_var(q_tr.sq_y, q_br.sq_y, q_tr.sum_y, q_br.sum_y))
        .abs();
    let ratio2_v_var_mv_scaled = (pooled_var(q_tl.sq_x, q_tr.sq_x, q_tl.sum_x, q_tr.sum_x)
        / pooled_var(q_bl.sq_x, q_br.sq_x, q_bl.sum_x, q_br.sum_x))
    .abs()
        + (pooled_var(q_tl.sq_y, q_tr.sq_y, q_tl.sum_y, q_tr.sum_y)
            / pooled_var(q_bl.sq_y, q_br.sq_y, q_bl.sum_y, q_br.sum_y))
        .abs();
    let ratio2_hv_var_mv_scaled = ratio2_h_var_mv_scaled / ratio2_v_var_mv_scaled;

    let ratio2_h_ave_sad = ((ave_sad_top_l + ave_sad_bot_l) / (ave_sad_top_r + ave_sad_bot_r)).abs();
    let ratio2_v_ave_sad = ((ave_sad_top_l + ave_sad_top_r) / (ave_sad_bot_l + ave_sad_bot_r)).abs();

    let ratio2_h_sobel = ((sobel_top_l + sobel_top_r) / (sobel_bot_l + sobel_bot_r)).abs();
    let ratio2_v_sobel = ((sobel_top_l + sobel_bot_l) / (sobel_top_r + sobel_bot_r)).abs();
    let ratio2_hv_sobel = ratio2_h_sobel / ratio2_v_sobel;

    // ------------------------------------------------------------------
    // Singular-denominator policy
    // ------------------------------------------------------------------
    if grad_ver_bot_r == 0.0
        || grad_ver_bot_l == 0.0
        || grad_ver_top_r == 0.0
        || grad_ver_top_l == 0.0
        || grad_ver == 0.0
    {
        trace!(area = %area, "vertical gradient vanished, classifier skipped");
        return Err(PartitionError::singular("gradVer"));
    }

    let hor_ver_valid = !((ave_mv_top_r_scaled + ave_mv_bot_r_scaled) == 0.0
        || (ave_mv_bot_l_scaled + ave_mv_bot_r_scaled) == 0.0
        || (ave_sad_top_r + ave_sad_bot_r) == 0.0
        || (ave_sad_bot_l + ave_sad_bot_r) == 0.0
        || (sobel_bot_l + sobel_bot_r) == 0.0
        || (sobel_top_r + sobel_bot_r) == 0.0
        || ratio2_v_sobel == 0.0);

    // ------------------------------------------------------------------
    // Vector assembly; the order is the training order
    // ------------------------------------------------------------------
    let t_layer = pic.temporal_layer as f64;
    let flags = [
        class.is_intra as u8 as f64,
        class.is_inter as u8 as f64,
        class.is_merge as u8 as f64,
        class.is_geo as u8 as f64,
    ];

    let qt_mtt_f64: [f64; QT_MTT_DIMS] = [
        t_layer,
        qp as f64,
        var,
        grad_hor,
        grad_ver,
        grad_ratio,
        var_top_l,
        var_top_r,
        var_bot_l,
        var_bot_r,
        var_mv_scaled,
        var_mv_top_l_scaled,
        var_mv_top_r_scaled,
        var_mv_bot_l_scaled,
        var_mv_bot_r_scaled,
        eigen_difference,
        ave_sad,
        var_sad,
        var_sad_top_l,
        var_sad_top_r,
        var_sad_bot_l,
        var_sad_bot_r,
        sobel_top_l,
        sobel_top_r,
        sobel_bot_l,
        sobel_bot_r,
        ratio2_h_grad,
        ratio2_v_grad,
        ratio2_h_var_mv_scaled,
        ratio2_v_var_mv_scaled,
        ratio2_hv_var_mv_scaled,
        flags[0],
        flags[1],
        flags[2],
    ];

    let hor_ver_f64: [f64; HOR_VER_DIMS] = [
        t_layer,
        qp as f64,
        var,
        grad_hor,
        grad_ver,
        grad_ratio,
        var_top_l,
        var_top_r,
        var_bot_l,
        var_bot_r,
        var_mv_scaled,
        var_mv_top_l_scaled,
        var_mv_top_r_scaled,
        var_mv_bot_l_scaled,
        var_mv_bot_r_scaled,
        ave_mv_scaled,
        ave_mv_top_l_scaled,
        ave_mv_top_r_scaled,
        ave_mv_bot_l_scaled,
        ave_mv_bot_r_scaled,
        ave_sad,
        var_sad,
        var_sad_top_l,
        var_sad_top_r,
        var_sad_bot_l,
        var_sad_bot_r,
        sobel_top_l,
        sobel_top_r,
        sobel_bot_l,
        sobel_bot_r,
        ratio2_h_var_pix,
        ratio2_v_var_pix,
        ratio2_h_grad,
        ratio2_v_grad,
        ratio2_h_var_mv_scaled,
        ratio2_v_var_mv_scaled,
        ratio2_h_ave_sad,
        ratio2_v_ave_sad,
        ratio2_h_sobel,
        ratio2_v_sobel,
        ratio2_hv_sobel,
        flags[0],
        flags[1],
        flags[2],
        flags[3],
    ];

    let mut qt_mtt = [0.0f32; QT_MTT_DIMS];
    for (dst, src) in qt_mtt.iter_mut().zip(qt_mtt_f64.iter()) {
        *dst = *src as f32;
    }
    let mut hor_ver = [0.0f32; HOR_VER_DIMS];
    for (dst, src) in hor_ver.iter_mut().zip(hor_ver_f64.iter()) {
        *dst = *src as f32;
    }

    Ok(FeatureBundle {
        qt_mtt,
        hor_ver,
        hor_ver_valid,
    })
}
