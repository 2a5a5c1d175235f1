use retrofire_draw::{
    prelude::*,
    render::state::{DepthOffset, LineStipple, PerWinding},
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn empty_config_is_default() {
    let state: RasterState = serde_json::from_str("{}").unwrap();
    assert_eq!(state, RasterState::default());
}

#[test]
fn partial_raster_state() {
    let json = r#"{
        "fill": { "cw": "Line", "ccw": "Fill" },
        "cull": "Back",
        "line_width": 2.5,
        "line_stipple": { "factor": 3, "pattern": 61680 },
        "offset": { "cw": null, "ccw": { "units": 2.0 } }
    }"#;
    let state: RasterState = serde_json::from_str(json).unwrap();

    assert_eq!(
        state,
        RasterState {
            fill: PerWinding { cw: FillMode::Line, ccw: FillMode::Fill },
            cull: CullMode::Back,
            line_width: 2.5,
            line_stipple: Some(LineStipple { factor: 3, pattern: 0xF0F0 }),
            offset: PerWinding {
                cw: None,
                ccw: Some(DepthOffset { units: 2.0, scale: 0.0 }),
            },
            ..RasterState::default()
        }
    );
}

#[test]
fn unknown_variant_is_error() {
    let res = serde_json::from_str::<RasterState>(r#"{ "cull": "Sideways" }"#);
    assert!(res.is_err());
}

#[test]
fn viewport_and_layout() {
    let vp: Viewport = serde_json::from_str(
        r#"{ "scale": [50, -50, 0.5, 1], "translate": [50, 50, 0.5, 0] }"#,
    )
    .unwrap();
    assert_eq!(vp, Viewport::new(0.0, 0.0, 100.0, 100.0));

    let sems: Vec<Semantic> =
        serde_json::from_str(r#"[{ "Color": 0 }, { "BackColor": 0 }, "PointSize"]"#)
            .unwrap();
    let layout = VertexLayout::new(&sems).unwrap();
    assert_eq!(layout.find(Semantic::PointSize), Some(2));
}

#[test]
fn loaded_state_composes_pipeline() {
    init();
    let json = r#"{ "flat_shade": true, "fill": { "cw": "Point", "ccw": "Point" } }"#;
    let state: RasterState = serde_json::from_str(json).unwrap();

    let mut ctx = DrawContext::new();
    ctx.set_vertex_attributes(VertexLayout::generic(2).unwrap());
    ctx.set_raster_state(state);
    assert_eq!(
        ctx.stage_names().collect::<Vec<_>>(),
        ["flat", "clip", "cull", "unfilled"]
    );

    let round_trip: RasterState =
        serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();
    assert_eq!(round_trip, state);
}
