#![no_main]

use fitview::error::ViewerError;
use fitview::fit::{self, FitMode, FitOptions};
use fitview::geom::Rect;
use fitview::surface::{ChannelOrder, PixelBuffer, PixelSurface, SurfaceBox, blit};
use libfuzzer_sys::fuzz_target;

// Fit a page into a small viewport, then compose it; either the page lands
// inside the surface or the surface is left untouched.
fuzz_target!(|data: [u8; 8]| {
    let [pw, ph, vw, vh, sw, sh, rot, flags] = data;
    let page = Rect::from_size(f32::from(pw), f32::from(ph));
    let opts = FitOptions {
        mode: if flags & 1 == 0 { FitMode::Aspect } else { FitMode::Stretch },
        rotation: f32::from(rot % 4) * 90.0,
        explicit_resolution: flags & 2 != 0,
        ..FitOptions::default()
    };
    let fit = fit::compute(page, u32::from(vw % 64), u32::from(vh % 64), &opts);
    let (w, h) = (fit.bbox.width(), fit.bbox.height());
    assert!(w >= 1 && h >= 1);
    if w > 512 || h > 512 {
        return;
    }

    let mut rendered =
        PixelBuffer::new(w, h, ChannelOrder::Rgba, vec![0xab; (w * h * 4) as usize]).unwrap();
    let mut surface = PixelSurface::new(u32::from(sw % 64), u32::from(sh % 64), ChannelOrder::Bgra);
    let area = SurfaceBox::new(0, 0, u32::from(vw % 64), u32::from(vh % 64));
    match blit(&mut rendered, &mut surface, area) {
        Ok(()) => assert!(surface.data().contains(&0xab) || surface.data().is_empty()),
        Err(ViewerError::OutOfBounds { .. }) => assert!(surface.data().iter().all(|&b| b == 0)),
        Err(e) => panic!("unexpected error: {e}"),
    }
});
