use sketch_slideshow::tasks::viewer::layout::{
    FitRect, Viewport, WindowChrome, WindowRect, center_offset, fit_to_viewport,
    resize_to_contain, standalone_window,
};

#[test]
fn wide_image_is_letterboxed() {
    let rect = fit_to_viewport(4000, 2000, Viewport::default());
    assert_eq!(
        rect,
        FitRect {
            x: 0,
            y: 60,
            width: 1920,
            height: 960
        }
    );
}

#[test]
fn tall_image_is_pillarboxed() {
    let rect = fit_to_viewport(1000, 2000, Viewport::default());
    assert_eq!((rect.width, rect.height), (540, 1080));
    assert_eq!((rect.x, rect.y), (690, 0));
}

#[test]
fn contain_never_exceeds_canvas() {
    for (w, h) in [(1, 1), (3, 7919), (7919, 3), (1920, 1080), (10_000, 10_000)] {
        let (fw, fh) = resize_to_contain(800, 600, w, h);
        assert!(fw >= 1 && fw <= 800, "{w}x{h} -> {fw}");
        assert!(fh >= 1 && fh <= 600, "{w}x{h} -> {fh}");
    }
}

#[test]
fn center_offset_handles_oversized_inner() {
    assert_eq!(center_offset(100, 50, 300, 150), (100, 50));
    assert_eq!(center_offset(400, 200, 300, 150), (0, 0));
}

#[test]
fn standalone_window_keeps_center() {
    let current = WindowRect {
        x: 100,
        y: 100,
        width: 800,
        height: 600,
    };
    let max = Viewport {
        width: 1000,
        height: 1000,
    };
    let next = standalone_window(400, 400, max, current, WindowChrome::default());
    assert_eq!((next.width, next.height), (1000, 1000));
    assert_eq!((next.x, next.y), (0, -100));

    let chrome = WindowChrome {
        width: 10,
        height: 30,
    };
    let next = standalone_window(2000, 1000, max, current, chrome);
    assert_eq!((next.width, next.height), (1010, 530));
    assert_eq!((next.x, next.y), (-5, 135));
}
