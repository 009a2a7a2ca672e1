use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use magnifier_core::{
    AttachOutcome, Callbacks, Dispatcher, DisplayMode, HoverKind, HoverSnapshot, ImageRole,
    LargePlacement, LensFrame, LensStyle, LoadStage, MagnifierError, MagnifierOptions,
    RenderSurface, Size, ThumbAttributes, ThumbConfig, ThumbId, ThumbOptions, ThumbRect,
    WheelDirection,
};

#[derive(Clone, Debug, PartialEq)]
enum Op {
    CreateLens(String),
    Request(String, ImageRole, String),
    ShowLoading(String, Size),
    Install(String, LargePlacement, Size, Size),
    LensStyle(String, LensStyle, bool),
    LargeHidden(String, bool),
    ThumbActive(String, bool),
    PlaceLens(String, LensFrame),
    ResizeLens(String, Size),
    PlaceLarge(String, f64, f64),
    ResizeLarge(String, Size),
    ZoomListener(String),
}

#[derive(Default)]
struct RecordingSurface {
    rects: HashMap<ThumbId, ThumbRect>,
    ops: Vec<Op>,
}

impl RecordingSurface {
    fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    fn last_lens_style(&self) -> Option<(LensStyle, bool)> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::LensStyle(_, style, hidden) => Some((*style, *hidden)),
            _ => None,
        })
    }
}

impl RenderSurface for RecordingSurface {
    fn bounding_rect(&self, thumb: &ThumbId) -> Option<ThumbRect> {
        self.rects.get(thumb).copied()
    }

    fn create_lens(&mut self, thumb: &ThumbId) {
        self.ops.push(Op::CreateLens(thumb.to_string()));
    }

    fn request_image(&mut self, thumb: &ThumbId, role: ImageRole, url: &str) {
        self.ops.push(Op::Request(thumb.to_string(), role, url.to_string()));
    }

    fn show_loading(&mut self, thumb: &ThumbId, lens: Size) {
        self.ops.push(Op::ShowLoading(thumb.to_string(), lens));
    }

    fn install_large(
        &mut self,
        thumb: &ThumbId,
        placement: &LargePlacement,
        lens: Size,
        large: Size,
    ) {
        self.ops
            .push(Op::Install(thumb.to_string(), placement.clone(), lens, large));
    }

    fn set_lens_style(&mut self, thumb: &ThumbId, style: LensStyle, hidden: bool) {
        self.ops.push(Op::LensStyle(thumb.to_string(), style, hidden));
    }

    fn set_large_hidden(&mut self, thumb: &ThumbId, hidden: bool) {
        self.ops.push(Op::LargeHidden(thumb.to_string(), hidden));
    }

    fn set_thumb_active(&mut self, thumb: &ThumbId, active: bool) {
        self.ops.push(Op::ThumbActive(thumb.to_string(), active));
    }

    fn place_lens(&mut self, thumb: &ThumbId, frame: LensFrame) {
        self.ops.push(Op::PlaceLens(thumb.to_string(), frame));
    }

    fn resize_lens(&mut self, thumb: &ThumbId, size: Size) {
        self.ops.push(Op::ResizeLens(thumb.to_string(), size));
    }

    fn place_large(&mut self, thumb: &ThumbId, left: f64, top: f64) {
        self.ops.push(Op::PlaceLarge(thumb.to_string(), left, top));
    }

    fn resize_large(&mut self, thumb: &ThumbId, size: Size) {
        self.ops.push(Op::ResizeLarge(thumb.to_string(), size));
    }

    fn attach_zoom_listener(&mut self, thumb: &ThumbId) {
        self.ops.push(Op::ZoomListener(thumb.to_string()));
    }
}

type Log = Rc<RefCell<Vec<(HoverKind, HoverSnapshot)>>>;

fn recording_callbacks(log: &Log) -> Callbacks {
    let make = |kind: HoverKind| {
        let log = log.clone();
        Some(Rc::new(move |snapshot: &HoverSnapshot| {
            log.borrow_mut().push((kind, snapshot.clone()));
        }) as Rc<dyn Fn(&HoverSnapshot)>)
    };
    Callbacks {
        on_enter: make(HoverKind::Enter),
        on_move: make(HoverKind::Move),
        on_leave: make(HoverKind::Leave),
        on_zoom: make(HoverKind::Zoom),
    }
}

fn config(mode: DisplayMode, zoomable: bool, callbacks: Callbacks) -> ThumbConfig {
    let options = ThumbOptions {
        mode: Some(mode),
        zoomable: Some(zoomable),
        large_wrapper: Some("preview".to_string()),
        callbacks,
        ..ThumbOptions::default()
    };
    let attrs = ThumbAttributes {
        src: "thumb.jpg".to_string(),
        large_url: Some("large.jpg".to_string()),
        ..ThumbAttributes::default()
    };
    options
        .resolve(&attrs, &MagnifierOptions::default(), |_| Some(Size::new(400.0, 300.0)))
        .expect("config resolves")
}

fn dispatcher_with(ids: &[&str]) -> Dispatcher<RecordingSurface> {
    let mut surface = RecordingSurface::default();
    for (idx, id) in ids.iter().enumerate() {
        surface.rects.insert(
            ThumbId::from(*id),
            ThumbRect::from_origin_size(10.0 + 300.0 * idx as f64, 20.0, 200.0, 150.0),
        );
    }
    Dispatcher::new(MagnifierOptions::default(), surface)
}

fn loaded(
    dispatcher: &mut Dispatcher<RecordingSurface>,
    id: &str,
    mode: DisplayMode,
    zoomable: bool,
    callbacks: Callbacks,
) -> ThumbId {
    let id = ThumbId::from(id);
    dispatcher
        .attach(id.clone(), config(mode, zoomable, callbacks))
        .expect("attach");
    dispatcher.image_loaded(&id, ImageRole::Thumbnail).expect("thumb load");
    dispatcher.image_loaded(&id, ImageRole::Large).expect("large load");
    id
}

#[test]
fn attach_requests_thumbnail_then_large_image() {
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = ThumbId::from("a");
    let outcome = dispatcher
        .attach(id.clone(), config(DisplayMode::External, false, Callbacks::default()))
        .expect("attach");
    assert_eq!(outcome, AttachOutcome::Attached);
    assert_eq!(
        dispatcher.surface().ops,
        vec![
            Op::CreateLens("a".into()),
            Op::Request("a".into(), ImageRole::Thumbnail, "thumb.jpg".into()),
        ]
    );

    assert_eq!(
        dispatcher.image_loaded(&id, ImageRole::Thumbnail),
        Ok(LoadStage::ThumbnailLoaded)
    );
    let ops = &dispatcher.surface().ops;
    assert_eq!(ops[2], Op::ShowLoading("a".into(), Size::new(100.0, 75.0)));
    assert_eq!(ops[3], Op::Request("a".into(), ImageRole::Large, "large.jpg".into()));

    assert_eq!(dispatcher.image_loaded(&id, ImageRole::Large), Ok(LoadStage::LargeLoaded));
    assert_eq!(
        dispatcher.surface().ops[4],
        Op::Install(
            "a".into(),
            LargePlacement::Wrapper("preview".into()),
            Size::new(100.0, 75.0),
            Size::new(800.0, 600.0),
        )
    );
}

#[test]
fn load_stages_never_skip_or_regress() {
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = ThumbId::from("a");
    dispatcher
        .attach(id.clone(), config(DisplayMode::Inline, false, Callbacks::default()))
        .expect("attach");

    let skipped = dispatcher.image_loaded(&id, ImageRole::Large);
    assert!(matches!(skipped, Err(MagnifierError::StageOutOfOrder { .. })));
    assert_eq!(dispatcher.state(&id).map(|s| s.stage), Some(LoadStage::NotLoaded));

    dispatcher.image_loaded(&id, ImageRole::Thumbnail).expect("thumb load");
    let repeated = dispatcher.image_loaded(&id, ImageRole::Thumbnail);
    assert!(repeated.is_err());
    dispatcher.image_loaded(&id, ImageRole::Large).expect("large load");
    assert!(dispatcher.image_loaded(&id, ImageRole::Thumbnail).is_err());
    assert_eq!(dispatcher.state(&id).map(|s| s.stage), Some(LoadStage::LargeLoaded));
}

#[test]
fn inline_large_image_goes_into_lens() {
    let mut dispatcher = dispatcher_with(&["a"]);
    loaded(&mut dispatcher, "a", DisplayMode::Inline, false, Callbacks::default());
    let installs = dispatcher
        .surface()
        .count(|op| matches!(op, Op::Install(_, LargePlacement::Lens, _, _)));
    assert_eq!(installs, 1);
}

#[test]
fn reattach_keeps_state_and_moves_current() {
    let mut dispatcher = dispatcher_with(&["a", "b"]);
    let a = loaded(&mut dispatcher, "a", DisplayMode::External, false, Callbacks::default());
    let b = loaded(&mut dispatcher, "b", DisplayMode::External, false, Callbacks::default());
    assert_eq!(dispatcher.session().current, Some(b));

    let requests_before = dispatcher.surface().count(|op| matches!(op, Op::Request(..)));
    let outcome = dispatcher
        .attach(a.clone(), config(DisplayMode::Inline, true, Callbacks::default()))
        .expect("re-attach");
    assert_eq!(outcome, AttachOutcome::AlreadyAttached);
    assert_eq!(dispatcher.session().current, Some(a.clone()));
    assert_eq!(dispatcher.state(&a).map(|s| s.stage), Some(LoadStage::LargeLoaded));
    assert_eq!(dispatcher.state(&a).map(|s| s.config.mode), Some(DisplayMode::External));
    assert_eq!(
        dispatcher.surface().count(|op| matches!(op, Op::Request(..))),
        requests_before
    );
}

#[test]
fn enter_shows_lens_and_reports_snapshot() {
    let log: Log = Rc::default();
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, false, recording_callbacks(&log));

    let notes = dispatcher.pointer_enter(id.clone(), 60.0, 70.0).expect("enter");
    assert_eq!(notes.kinds(), vec![HoverKind::Enter]);
    notes.deliver();

    let log = log.borrow();
    let (_, snapshot) = &log[0];
    assert_eq!(snapshot.thumb, id);
    assert_eq!(snapshot.lens, "a-lens");
    assert_eq!(snapshot.large.as_deref(), Some("a-large"));
    assert_eq!((snapshot.x, snapshot.y), (60.0, 70.0));

    let surface = dispatcher.surface();
    assert_eq!(surface.last_lens_style(), Some((LensStyle::Lens, false)));
    assert!(surface.ops.contains(&Op::PlaceLens(
        "a".into(),
        LensFrame {
            left: 0.0,
            top: 13.0,
            background_x: 1.0,
            background_y: 14.0,
        }
    )));
    assert!(surface.ops.contains(&Op::PlaceLarge("a".into(), 4.0, 56.0)));
    assert!(surface.ops.contains(&Op::ThumbActive("a".into(), true)));
    assert!(dispatcher.session().lens_shown);
}

#[test]
fn enter_while_large_loading_shows_loader() {
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = ThumbId::from("a");
    dispatcher
        .attach(id.clone(), config(DisplayMode::External, true, Callbacks::default()))
        .expect("attach");
    dispatcher.image_loaded(&id, ImageRole::Thumbnail).expect("thumb load");

    dispatcher.pointer_enter(id.clone(), 60.0, 70.0).expect("enter").deliver();
    let surface = dispatcher.surface();
    assert_eq!(surface.last_lens_style(), Some((LensStyle::Loader, false)));
    assert_eq!(surface.count(|op| matches!(op, Op::PlaceLarge(..))), 0);
    assert_eq!(surface.count(|op| matches!(op, Op::ZoomListener(_))), 0);
    assert!(dispatcher.wheel(WheelDirection::In).is_none());
}

#[test]
fn enter_before_any_load_renders_nothing() {
    let log: Log = Rc::default();
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = ThumbId::from("a");
    dispatcher
        .attach(id.clone(), config(DisplayMode::External, false, recording_callbacks(&log)))
        .expect("attach");
    let ops_before = dispatcher.surface().ops.len();

    dispatcher.pointer_enter(id, 60.0, 70.0).expect("enter").deliver();
    assert_eq!(dispatcher.surface().ops.len(), ops_before);
    assert!(!dispatcher.session().lens_shown);

    let leave = dispatcher.pointer_move(0.0, 0.0);
    assert!(leave.is_empty());
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn unknown_thumbnail_enter_is_rejected() {
    let mut dispatcher = dispatcher_with(&[]);
    let err = dispatcher.pointer_enter(ThumbId::from("ghost"), 1.0, 1.0).err();
    assert_eq!(err, Some(MagnifierError::UnknownThumbnail(ThumbId::from("ghost"))));
    assert!(dispatcher.session().active.is_none());
}

#[test]
fn leave_is_reported_once_per_exit() {
    let log: Log = Rc::default();
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, false, recording_callbacks(&log));
    dispatcher.pointer_enter(id, 60.0, 70.0).expect("enter").deliver();

    dispatcher.pointer_move(80.0, 80.0).deliver();
    for x in [5.0, 4.0, 1.0, -20.0] {
        dispatcher.pointer_move(x, 80.0).deliver();
    }
    let kinds: Vec<_> = log.borrow().iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, vec![HoverKind::Enter, HoverKind::Move, HoverKind::Leave]);
    assert!(!dispatcher.session().in_bounds);

    let surface = dispatcher.surface();
    assert_eq!(surface.last_lens_style(), Some((LensStyle::Lens, true)));
    assert!(surface.ops.contains(&Op::LargeHidden("a".into(), true)));
    assert!(surface.ops.contains(&Op::ThumbActive("a".into(), false)));
}

#[test]
fn moving_back_inside_shows_lens_again() {
    let log: Log = Rc::default();
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, false, recording_callbacks(&log));
    dispatcher.pointer_enter(id, 60.0, 70.0).expect("enter").deliver();
    dispatcher.pointer_move(0.0, 0.0).deliver();
    dispatcher.pointer_move(100.0, 100.0).deliver();

    assert!(dispatcher.session().lens_shown);
    assert_eq!(dispatcher.surface().last_lens_style(), Some((LensStyle::Lens, false)));
    let kinds: Vec<_> = log.borrow().iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, vec![HoverKind::Enter, HoverKind::Leave, HoverKind::Move]);
}

#[test]
fn entering_another_thumbnail_leaves_the_previous_one_first() {
    let log: Log = Rc::default();
    let mut dispatcher = dispatcher_with(&["a", "b"]);
    let a = loaded(&mut dispatcher, "a", DisplayMode::External, false, recording_callbacks(&log));
    let b = loaded(&mut dispatcher, "b", DisplayMode::External, false, recording_callbacks(&log));

    dispatcher.pointer_enter(a.clone(), 60.0, 70.0).expect("enter a").deliver();
    let notes = dispatcher.pointer_enter(b.clone(), 360.0, 70.0).expect("enter b");
    assert_eq!(notes.kinds(), vec![HoverKind::Leave, HoverKind::Enter]);
    notes.deliver();

    let log = log.borrow();
    assert_eq!(log[1].1.thumb, a);
    assert_eq!(log[2].1.thumb, b);
    assert_eq!(dispatcher.session().active, Some(b));
}

#[test]
fn wheel_listener_is_attached_once() {
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, true, Callbacks::default());
    for _ in 0..3 {
        dispatcher.pointer_enter(id.clone(), 60.0, 70.0).expect("enter").deliver();
        dispatcher.pointer_move(0.0, 0.0).deliver();
    }
    assert_eq!(dispatcher.surface().count(|op| matches!(op, Op::ZoomListener(_))), 1);
    assert!(dispatcher.state(&id).is_some_and(|s| s.zoom_listener_attached));
}

#[test]
fn reentering_loaded_thumbnail_requests_nothing_new() {
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, true, Callbacks::default());
    let is_request = |op: &Op| matches!(op, Op::Request(..));
    assert_eq!(dispatcher.surface().count(is_request), 2);

    for _ in 0..4 {
        dispatcher.pointer_enter(id.clone(), 60.0, 70.0).expect("enter").deliver();
        dispatcher.pointer_move(80.0, 90.0).deliver();
        dispatcher.pointer_leave().deliver();
        dispatcher.pointer_enter(id.clone(), 100.0, 100.0).expect("enter").deliver();
        dispatcher.pointer_move(0.0, 0.0).deliver();
    }
    assert_eq!(dispatcher.surface().count(is_request), 2);
    assert_eq!(dispatcher.state(&id).map(|s| s.stage), Some(LoadStage::LargeLoaded));
}

#[test]
fn non_zoomable_thumbnail_ignores_wheel() {
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, false, Callbacks::default());
    dispatcher.pointer_enter(id.clone(), 60.0, 70.0).expect("enter").deliver();
    assert_eq!(dispatcher.surface().count(|op| matches!(op, Op::ZoomListener(_))), 0);
    assert!(dispatcher.wheel(WheelDirection::In).is_none());
    assert_eq!(dispatcher.state(&id).map(|s| s.geometry.zoom), Some(2.0));
}

#[test]
fn wheel_zoom_updates_surface_and_reports() {
    let log: Log = Rc::default();
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, true, recording_callbacks(&log));
    dispatcher.pointer_enter(id.clone(), 110.0, 95.0).expect("enter").deliver();

    let notes = dispatcher.wheel(WheelDirection::In).expect("wheel consumed");
    assert_eq!(notes.kinds(), vec![HoverKind::Zoom]);
    notes.deliver();

    let state = dispatcher.state(&id).expect("state");
    assert_eq!(state.geometry.zoom, 2.1);
    let surface = dispatcher.surface();
    assert!(surface.ops.contains(&Op::ResizeLens("a".into(), Size::new(95.0, 71.0))));
    assert!(surface.ops.contains(&Op::ResizeLarge("a".into(), Size::new(840.0, 630.0))));

    let log = log.borrow();
    let (kind, snapshot) = log.last().expect("zoom reported");
    assert_eq!(*kind, HoverKind::Zoom);
    let zoom = snapshot.zoom.expect("zoom values");
    assert_eq!(zoom.zoom, 4.2);
    assert_eq!((zoom.lens_width, zoom.lens_height), (95.0, 71.0));
}

#[test]
fn wheel_at_floor_is_consumed_without_report() {
    let log: Log = Rc::default();
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = ThumbId::from("a");
    let mut cfg = config(DisplayMode::Inline, true, recording_callbacks(&log));
    cfg.zoom = 1.1;
    dispatcher.attach(id.clone(), cfg).expect("attach");
    dispatcher.image_loaded(&id, ImageRole::Thumbnail).expect("thumb load");
    dispatcher.image_loaded(&id, ImageRole::Large).expect("large load");
    dispatcher.pointer_enter(id.clone(), 60.0, 70.0).expect("enter").deliver();

    let notes = dispatcher.wheel(WheelDirection::Out).expect("wheel consumed");
    assert!(notes.is_empty());
    assert_eq!(dispatcher.state(&id).map(|s| s.geometry.zoom), Some(1.1));
}

#[test]
fn pinning_to_floor_resizes_surface_without_report() {
    let log: Log = Rc::default();
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = ThumbId::from("a");
    let mut cfg = config(DisplayMode::Inline, true, recording_callbacks(&log));
    cfg.zoom = 1.15;
    dispatcher.attach(id.clone(), cfg).expect("attach");
    dispatcher.image_loaded(&id, ImageRole::Thumbnail).expect("thumb load");
    dispatcher.image_loaded(&id, ImageRole::Large).expect("large load");
    dispatcher.pointer_enter(id.clone(), 60.0, 70.0).expect("enter").deliver();
    log.borrow_mut().clear();

    let notes = dispatcher.wheel(WheelDirection::Out).expect("wheel consumed");
    assert!(notes.is_empty());
    notes.deliver();

    let state = dispatcher.state(&id).expect("state");
    assert_eq!(state.geometry.zoom, 1.1);
    assert_eq!(state.geometry.lens_size(), Size::new(182.0, 136.0));
    let surface = dispatcher.surface();
    assert!(surface.ops.contains(&Op::ResizeLens("a".into(), Size::new(182.0, 136.0))));
    assert!(surface.ops.contains(&Op::ResizeLarge("a".into(), Size::new(220.0, 165.0))));
    assert!(log.borrow().is_empty());
}

#[test]
fn wheel_with_hidden_lens_is_not_consumed() {
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, true, Callbacks::default());
    dispatcher.pointer_enter(id, 60.0, 70.0).expect("enter").deliver();
    dispatcher.pointer_leave().deliver();
    assert!(dispatcher.wheel(WheelDirection::In).is_none());
}

#[test]
fn scroll_remeasures_without_touching_visibility() {
    let mut dispatcher = dispatcher_with(&["a"]);
    let id = loaded(&mut dispatcher, "a", DisplayMode::External, false, Callbacks::default());
    dispatcher.pointer_enter(id.clone(), 60.0, 70.0).expect("enter").deliver();
    let styles_before = dispatcher
        .surface()
        .count(|op| matches!(op, Op::LensStyle(..) | Op::LargeHidden(..)));

    dispatcher
        .surface_mut()
        .rects
        .insert(id.clone(), ThumbRect::from_origin_size(10.0, -30.0, 200.0, 150.0));
    dispatcher.viewport_scroll();

    let state = dispatcher.state(&id).expect("state");
    assert_eq!(state.geometry.y, -30.0);
    assert_eq!(state.stage, LoadStage::LargeLoaded);
    assert!(dispatcher.session().lens_shown);
    assert_eq!(
        dispatcher
            .surface()
            .count(|op| matches!(op, Op::LensStyle(..) | Op::LargeHidden(..))),
        styles_before
    );
}

#[test]
fn scroll_without_current_thumbnail_is_a_no_op() {
    let mut dispatcher = dispatcher_with(&["a"]);
    dispatcher.viewport_scroll();
    assert!(dispatcher.registry().is_empty());
    assert!(dispatcher.surface().ops.is_empty());
}

#[test]
fn missing_callbacks_fall_back_to_instance_defaults() {
    let log: Log = Rc::default();
    let defaults = MagnifierOptions {
        callbacks: recording_callbacks(&log),
        ..MagnifierOptions::default()
    };
    let options = ThumbOptions {
        mode: Some(DisplayMode::Inline),
        ..ThumbOptions::default()
    };
    let cfg = options
        .resolve(&ThumbAttributes::default(), &defaults, |_| None)
        .expect("inline needs no wrapper");
    assert!(cfg.callbacks.on_move.is_some());

    let mut dispatcher = dispatcher_with(&["a"]);
    let id = ThumbId::from("a");
    dispatcher.attach(id.clone(), cfg).expect("attach");
    dispatcher.image_loaded(&id, ImageRole::Thumbnail).expect("thumb load");
    dispatcher.pointer_enter(id, 60.0, 70.0).expect("enter").deliver();
    assert_eq!(log.borrow().len(), 1);
}
