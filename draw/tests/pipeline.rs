use std::cell::Cell;

use retrofire_draw::{
    prelude::*,
    render::{
        prim::Reduced,
        sink::{Recorded, Recorder},
        state::{FillMode, LineStipple, PerWinding},
    },
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A 100×100 window with y pointing down.
fn viewport() -> Viewport {
    Viewport::new(0.0, 0.0, 100.0, 100.0)
}

fn ctx(layout: &[Semantic]) -> DrawContext {
    init();
    let mut ctx = DrawContext::new();
    ctx.set_viewport(viewport());
    ctx.set_vertex_attributes(VertexLayout::new(layout).unwrap());
    ctx
}

/// Shades vertex `i` of `pos`, copying its x coordinate to attribute 0.
fn shader(pos: &[[f32; 2]]) -> impl FnMut(u32, &mut VertexOutput) + '_ {
    |i, out| {
        let [x, y] = pos[i as usize];
        out.pos = vec4(x, y, 0.0, 1.0);
        out.attribs[0] = vec4(x, 0.0, 0.0, 0.0);
    }
}

fn edges(rec: &Recorder) -> Vec<[[f32; 2]; 2]> {
    rec.of_kind(Reduced::Line)
        .map(|r| [0, 1].map(|i| [r.verts[i].clip.x(), r.verts[i].clip.y()]))
        .collect()
}

#[test]
fn triangle_clipped_by_right_plane() {
    let mut ctx = ctx(&[Semantic::Generic]);
    let pos = [[0.0, 0.0], [2.0, 0.0], [0.0, 0.5]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::Triangles,
        0,
        3,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );

    // The clipped quad is drawn as a fan of two triangles
    assert_eq!(rec.prims.len(), 2);
    let mut xs: Vec<f32> = Vec::new();
    for Recorded { verts, .. } in &rec.prims {
        for v in verts {
            let x = v.clip.x();
            assert!(x <= 1.0 + 1e-6, "vertex outside right plane: {v:?}");
            // Attributes are interpolated along with the position
            assert!((v.attribs[0].x() - x).abs() < 1e-6);
            // Window position is the projected clip position
            assert!((v.win.x() - (x + 1.0) * 50.0).abs() < 1e-3);
            xs.push(x);
        }
    }
    assert!(xs.iter().any(|&x| (x - 1.0).abs() < 1e-6));
    assert!(xs.iter().all(|&x| x != 2.0));

    let stats = ctx.stats();
    eprintln!("Stats:\n{stats}");
    assert_eq!(stats.prims.i, 1);
    assert_eq!(stats.prims.o, 2);
}

#[test]
fn flat_color_survives_clipping() {
    let mut ctx = ctx(&[Semantic::Color(0)]);
    ctx.set_raster_state(RasterState {
        flat_shade: true,
        ..RasterState::default()
    });
    let pos = [[0.0, 0.0], [2.0, 0.0], [0.0, 0.5]];
    let colors = [
        vec4(1.0, 0.0, 0.0, 1.0),
        vec4(0.0, 1.0, 0.0, 1.0),
        vec4(0.0, 0.0, 1.0, 1.0),
    ];
    let mut shader = |i: u32, out: &mut VertexOutput| {
        let [x, y] = pos[i as usize];
        out.pos = vec4(x, y, 0.0, 1.0);
        out.attribs[0] = colors[i as usize];
    };
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::Triangles,
        0,
        3,
        &Elements::Linear,
        &mut shader,
        &mut rec,
    );

    assert_eq!(rec.prims.len(), 2);
    for v in rec.prims.iter().flat_map(|r| &r.verts) {
        // Including the vertices created on the right plane
        let d = v.attribs[0] - colors[2];
        assert!(d.dot(&d) < 1e-12, "not the last vertex's color: {v:?}");
    }
}

#[test]
fn fully_outside_triangle_is_dropped() {
    let mut ctx = ctx(&[Semantic::Generic]);
    let pos = [[2.0, 0.0], [3.0, 0.0], [2.0, 1.0]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::Triangles,
        0,
        3,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );
    assert!(rec.prims.is_empty());
}

#[test]
fn indexed_mesh_shades_each_vertex_once() {
    let mut ctx = ctx(&[Semantic::Generic]);

    // A 3×3 grid of vertices as a 2×2 grid of quads, two triangles each
    let pos: Vec<[f32; 2]> = (0..9)
        .map(|i| [(i % 3) as f32 * 0.5 - 0.5, (i / 3) as f32 * 0.5 - 0.5])
        .collect();
    let idx: Vec<u16> = [0, 1, 3, 4]
        .into_iter()
        .flat_map(|i| [i, i + 1, i + 3, i + 1, i + 4, i + 3])
        .collect();

    let invocations = Cell::new(0);
    let mut counting = |i: u32, out: &mut VertexOutput| {
        invocations.set(invocations.get() + 1);
        shader(&pos)(i, out);
    };
    let mut indexed = Recorder::default();
    ctx.draw(
        Topology::Triangles,
        0,
        idx.len() as u32,
        &Elements::U16(&idx),
        &mut counting,
        &mut indexed,
    );
    assert_eq!(invocations.get(), 9);
    assert_eq!(ctx.stats().verts.i, 24);
    assert_eq!(ctx.stats().verts.o, 9);

    // Same triangles without indices
    let flat: Vec<[f32; 2]> = idx.iter().map(|&i| pos[i as usize]).collect();
    let mut linear = Recorder::default();
    ctx.draw(
        Topology::Triangles,
        0,
        flat.len() as u32,
        &Elements::Linear,
        &mut shader(&flat),
        &mut linear,
    );
    assert_eq!(indexed.prims.len(), 8);
    let verts =
        |rec: &Recorder| rec.prims.iter().map(|r| r.verts).collect::<Vec<_>>();
    assert_eq!(verts(&indexed), verts(&linear));
}

#[test]
fn element_buffer_from_bytes() {
    let mut ctx = ctx(&[Semantic::Generic]);
    let pos = [[0.0, 0.0], [0.5, 0.0], [0.0, 0.5], [0.5, 0.5]];

    let idx: [u32; 3] = [3, 2, 1];
    let bytes: &[u8] = bytemuck::cast_slice(&idx);
    let elts = Elements::from_bytes(4, bytes).unwrap();
    assert_eq!(elts, Elements::U32(&idx));

    let mut rec = Recorder::default();
    ctx.draw(Topology::Triangles, 0, 3, &elts, &mut shader(&pos), &mut rec);
    assert_eq!(rec.prims.len(), 1);
    assert_eq!(rec.prims[0].verts[0].clip, vec4(0.5, 0.5, 0.0, 1.0));

    assert_eq!(
        Elements::from_bytes(4, &bytes[..5]),
        Err(Error::ElementLength { len: 5, width: 4 })
    );
    assert_eq!(
        Elements::from_bytes(4, &bytes[1..5]),
        Err(Error::ElementAlignment(4))
    );
}

#[test]
fn back_faces_get_back_colors() {
    let mut ctx = ctx(&[Semantic::Color(0), Semantic::BackColor(0)]);
    ctx.set_raster_state(RasterState {
        two_sided: true,
        ..RasterState::default()
    });
    let red = vec4(1.0, 0.0, 0.0, 1.0);
    let blue = vec4(0.0, 0.0, 1.0, 1.0);
    let pos = [[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5]];
    let mut shader = |i: u32, out: &mut VertexOutput| {
        let [x, y] = pos[i as usize];
        out.pos = vec4(x, y, 0.0, 1.0);
        out.attribs[0] = red;
        out.attribs[1] = blue;
    };

    let mut rec = Recorder::default();
    // Counter-clockwise, front-facing
    let elts = Elements::U8(&[0, 1, 2]);
    ctx.draw(Topology::Triangles, 0, 3, &elts, &mut shader, &mut rec);
    // Clockwise, back-facing
    let elts = Elements::U8(&[0, 2, 1]);
    ctx.draw(Topology::Triangles, 0, 3, &elts, &mut shader, &mut rec);

    assert_eq!(rec.prims.len(), 2);
    assert!(rec.prims[0].verts.iter().all(|v| v.attribs[0] == red));
    assert!(rec.prims[1].verts.iter().all(|v| v.attribs[0] == blue));
    // Front faces have a negative determinant with y pointing down
    assert!(rec.prims[0].prim.det < 0.0);
    assert!(rec.prims[1].prim.det > 0.0);
}

#[test]
fn back_faces_culled() {
    let mut ctx = ctx(&[Semantic::Generic]);
    ctx.set_raster_state(RasterState {
        cull: CullMode::Back,
        ..RasterState::default()
    });
    let pos = [[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5]];
    let mut rec = Recorder::default();
    let elts = Elements::U8(&[0, 1, 2, 0, 2, 1]);
    ctx.draw(Topology::Triangles, 0, 6, &elts, &mut shader(&pos), &mut rec);

    assert_eq!(rec.prims.len(), 1);
    assert_eq!(rec.prims[0].verts[1].clip.x(), 0.5);
}

#[test]
fn unit_square_quad_strip_covers_square() {
    let mut ctx = ctx(&[Semantic::Generic]);
    // Strip order: 0-1 is the first rung, 2-3 the second
    let pos = [[-0.5, 0.5], [-0.5, -0.5], [0.5, 0.5], [0.5, -0.5]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::QuadStrip,
        0,
        4,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );

    assert_eq!(rec.prims.len(), 2);
    // The square is 50×50 pixels; det is twice the triangle area
    let area: f32 = rec.prims.iter().map(|r| 0.5 * r.prim.det.abs()).sum();
    assert!((area - 2500.0).abs() < 1e-2, "{area}");
    // Exactly one edge of each triangle is the shared, non-drawn diagonal
    for r in &rec.prims {
        assert_eq!(r.prim.edges.bits().count_ones(), 2);
    }
}

#[test]
fn quad_outline_has_no_diagonal() {
    let mut ctx = ctx(&[Semantic::Generic]);
    ctx.set_raster_state(RasterState {
        fill: PerWinding::both(FillMode::Line),
        ..RasterState::default()
    });
    let pos = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::Quads,
        0,
        4,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );

    let mut lines = edges(&rec);
    assert_eq!(lines.len(), 4);
    for [a, b] in &mut lines {
        if a > b {
            std::mem::swap(a, b);
        }
    }
    lines.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(
        lines,
        [
            [[-0.5, -0.5], [-0.5, 0.5]],
            [[-0.5, -0.5], [0.5, -0.5]],
            [[-0.5, 0.5], [0.5, 0.5]],
            [[0.5, -0.5], [0.5, 0.5]],
        ]
    );
}

#[test]
fn clipped_outline_closed_along_clip_plane() {
    let mut ctx = ctx(&[Semantic::Generic]);
    ctx.set_raster_state(RasterState {
        fill: PerWinding::both(FillMode::Line),
        ..RasterState::default()
    });
    // Sticks out of the right edge of the view volume
    let pos = [[0.0, 0.0], [2.0, 0.0], [0.0, 0.5]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::Triangles,
        0,
        3,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );

    // The two shortened edges, the untouched edge, and the new edge along
    // the clip plane. The fan diagonal is not drawn.
    let lines = edges(&rec);
    assert_eq!(lines.len(), 4, "{lines:?}");
    let on_plane = lines
        .iter()
        .filter(|[a, b]| a[0] == 1.0 && b[0] == 1.0)
        .count();
    assert_eq!(on_plane, 1, "{lines:?}");
    assert!(lines.iter().flatten().all(|p| p[0] <= 1.0), "{lines:?}");
}

#[test]
fn wide_lines_become_triangles() {
    let mut ctx = ctx(&[Semantic::Generic]);
    ctx.set_raster_state(RasterState {
        line_width: 4.0,
        ..RasterState::default()
    });
    assert_eq!(
        ctx.stage_names().collect::<Vec<_>>(),
        ["clip", "cull", "wide"]
    );
    let pos = [[-0.5, 0.0], [0.5, 0.0], [0.5, 0.5]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::LineStrip,
        0,
        3,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );

    assert_eq!(rec.of_kind(Reduced::Line).count(), 0);
    assert_eq!(rec.of_kind(Reduced::Tri).count(), 4);
    // The first line is x-major and widened vertically by half the width
    let ys: Vec<f32> = rec.prims[..2]
        .iter()
        .flat_map(|r| r.verts.iter().map(|v| v.win.y()))
        .collect();
    let (min, max) = ys
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &y| (lo.min(y), hi.max(y)));
    assert!((max - min - 4.0).abs() < 1e-4, "{min}..{max}");
}

#[test]
fn points_outside_view_are_dropped() {
    let mut ctx = ctx(&[Semantic::Generic]);
    let pos = [[0.0, 0.0], [1.5, 0.0], [-0.9, 0.9]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::Points,
        0,
        3,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );
    let xs: Vec<f32> = rec.prims.iter().map(|r| r.verts[0].clip.x()).collect();
    assert_eq!(xs, [0.0, -0.9]);
}

#[test]
fn user_clip_plane() {
    let mut ctx = ctx(&[Semantic::Generic]);
    // Keep y ≥ 0
    ctx.set_clip_planes(&[vec4(0.0, 1.0, 0.0, 0.0)]).unwrap();
    let pos = [[-0.5, -0.5], [0.5, 0.5]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::Lines,
        0,
        2,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );

    assert_eq!(rec.prims.len(), 1);
    let [a, b] = [0, 1].map(|i| rec.prims[0].verts[i].clip);
    assert!(a.y().abs() < 1e-6, "{a:?}");
    assert_eq!(b, vec4(0.5, 0.5, 0.0, 1.0));
}

#[test]
fn stipple_continues_along_strip() {
    let mut ctx = ctx(&[Semantic::Generic]);
    ctx.set_raster_state(RasterState {
        // Two pixels per bit: 8 on, 8 off, 8 on, 8 off, ...
        line_stipple: Some(LineStipple { factor: 2, pattern: 0x0F0F }),
        ..RasterState::default()
    });
    // Two 25-pixel segments
    let pos = [[-0.5, 0.0], [0.0, 0.0], [0.5, 0.0]];
    let mut rec = Recorder::default();
    ctx.draw(
        Topology::LineStrip,
        0,
        3,
        &Elements::Linear,
        &mut shader(&pos),
        &mut rec,
    );

    let dashes: Vec<[f32; 2]> = rec
        .of_kind(Reduced::Line)
        .map(|r| [r.verts[0].win.x(), r.verts[1].win.x()])
        .collect();
    assert_eq!(dashes.len(), 4, "{dashes:?}");
    assert_eq!(dashes[0][0], 25.0);
    assert!((dashes[0][1] - 33.0).abs() < 1e-4, "{dashes:?}");
    // The counter is at 25 when the second segment starts
    assert!((dashes[2][0] - 57.0).abs() < 1e-4, "{dashes:?}");
}
