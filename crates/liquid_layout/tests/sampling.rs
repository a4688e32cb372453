//! Surfaces, the registry and what glass nodes get to sample

use liquid_core::{DrawCommand, Rect, Size};
use liquid_gpu::{BackendConfig, CapabilityTier};
use liquid_layout::prelude::*;
use liquid_layout::ModifierNode;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn full_renderer() -> Box<dyn LiquidRenderer> {
    create_renderer(CapabilityTier::Full, &BackendConfig::default())
}

#[test]
fn test_surface_and_glass_share_registry() {
    init_tracing();
    let mut host = HeadlessHost::new(Size::new(400.0, 400.0));
    let state = host.create_state();

    let surface = host.add_node(None, NodeFrame::new(0.0, 0.0, 50.0, 50.0)).unwrap();
    host.insert_liquefiable(surface, state.clone()).unwrap();
    let glass = host.add_node(None, NodeFrame::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    host.insert_liquid(glass, state.clone(), |_, _| {}, full_renderer()).unwrap();

    host.frame();

    assert_eq!(state.len(), 1);
    {
        let liquid = host.modifier::<LiquidNode>(glass, 0).unwrap();
        let sampled = liquid.params().liquefiables();
        assert_eq!(sampled.len(), 1);
        assert_eq!(
            sampled[0].bounds(host.graph()),
            Rect::new(0.0, 0.0, 50.0, 50.0)
        );
    }

    host.remove_node(surface).unwrap();
    assert!(state.is_empty());

    host.frame();
    let liquid = host.modifier::<LiquidNode>(glass, 0).unwrap();
    assert!(liquid.params().liquefiables().is_empty());
}

#[test]
fn test_surface_records_its_content() {
    init_tracing();
    let mut host = HeadlessHost::new(Size::new(400.0, 400.0));
    let state = host.create_state();

    let surface = host.add_node(None, NodeFrame::new(10.0, 10.0, 50.0, 50.0)).unwrap();
    host.set_background(surface, liquid_core::Color::RED).unwrap();
    host.insert_liquefiable(surface, state.clone()).unwrap();
    host.frame();

    let layer = {
        let node = host.modifier::<LiquefiableNode>(surface, 0).unwrap();
        node.liquefiable().and_then(|l| l.layer(host.graph()))
    };
    let layer = layer.expect("surface should hold a layer after drawing");
    let recorded = host.layers().get(layer).unwrap();
    assert_eq!(recorded.size(), Size::new(50.0, 50.0));
    assert!(matches!(recorded.commands(), [DrawCommand::FillRect { .. }]));
    assert!(host
        .last_frame()
        .iter()
        .any(|c| *c == DrawCommand::DrawLayer(layer)));

    host.remove_node(surface).unwrap();
    assert!(host.layers().is_released(layer));
}

#[test]
fn test_glass_skips_its_own_ancestor() {
    init_tracing();
    let mut host = HeadlessHost::new(Size::new(400.0, 400.0));
    let state = host.create_state();

    // Dual role on one node: surface first, glass after it in the chain
    let dual = host.add_node(None, NodeFrame::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    host.insert_liquefiable(dual, state.clone()).unwrap();
    host.insert_liquid(dual, state.clone(), |_, _| {}, full_renderer()).unwrap();

    // Glass nested under a surface node
    let backdrop = host.add_node(None, NodeFrame::new(100.0, 0.0, 200.0, 200.0)).unwrap();
    host.insert_liquefiable(backdrop, state.clone()).unwrap();
    let nested = host
        .add_node(Some(backdrop), NodeFrame::new(10.0, 10.0, 50.0, 50.0))
        .unwrap();
    host.insert_liquid(nested, state.clone(), |_, _| {}, full_renderer()).unwrap();

    host.frame();
    assert_eq!(state.len(), 2);

    let dual_surface = host
        .modifier::<LiquefiableNode>(dual, 0)
        .unwrap()
        .liquefiable();
    let backdrop_surface = host
        .modifier::<LiquefiableNode>(backdrop, 0)
        .unwrap()
        .liquefiable();
    assert!(dual_surface.is_some() && backdrop_surface.is_some());

    let dual_list = host
        .modifier::<LiquidNode>(dual, 1)
        .unwrap()
        .params()
        .liquefiables()
        .to_vec();
    assert_eq!(dual_list.len(), 1);
    assert_eq!(Some(dual_list[0]), backdrop_surface);

    let nested_list = host
        .modifier::<LiquidNode>(nested, 0)
        .unwrap()
        .params()
        .liquefiables()
        .to_vec();
    assert_eq!(nested_list.len(), 1);
    assert_eq!(Some(nested_list[0]), dual_surface);

    // The registry itself is unfiltered
    let all = state.liquefiables(host.graph());
    assert!(all.iter().any(|l| Some(*l) == dual_surface));
    assert!(all.iter().any(|l| Some(*l) == backdrop_surface));
}

#[test]
fn test_surfaces_added_later_are_picked_up() {
    init_tracing();
    let mut host = HeadlessHost::new(Size::new(400.0, 400.0));
    let state = host.create_state();

    let glass = host.add_node(None, NodeFrame::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    host.insert_liquid(glass, state.clone(), |_, _| {}, full_renderer()).unwrap();
    host.frame();
    let before = host.draw_requests(glass).unwrap();

    let surface = host.add_node(None, NodeFrame::new(20.0, 20.0, 40.0, 40.0)).unwrap();
    host.insert_liquefiable(surface, state.clone()).unwrap();
    host.frame();

    let liquid = host.modifier::<LiquidNode>(glass, 0).unwrap();
    assert_eq!(liquid.params().liquefiables().len(), 1);
    assert_eq!(host.draw_requests(glass).unwrap(), before + 1);
}

#[test]
fn test_moving_surface_to_another_registry() {
    init_tracing();
    let mut host = HeadlessHost::new(Size::new(400.0, 400.0));
    let first = host.create_state();
    let second = host.create_state();

    let surface = host.add_node(None, NodeFrame::new(0.0, 0.0, 50.0, 50.0)).unwrap();
    host.insert_liquefiable(surface, first.clone()).unwrap();
    assert_eq!((first.len(), second.len()), (1, 0));

    let target = second.clone();
    host.with_modifier::<LiquefiableNode, _>(surface, 0, |node, cx| node.update(cx, target))
        .unwrap();
    assert_eq!((first.len(), second.len()), (0, 1));

    host.remove_node(surface).unwrap();
    assert!(second.is_empty());
}

#[test]
fn test_composite_skips_surfaces_outside_the_glass() {
    init_tracing();
    let mut host = HeadlessHost::new(Size::new(800.0, 800.0));
    let state = host.create_state();

    let near = host.add_node(None, NodeFrame::new(0.0, 0.0, 80.0, 80.0)).unwrap();
    host.insert_liquefiable(near, state.clone()).unwrap();
    let far = host.add_node(None, NodeFrame::new(500.0, 500.0, 80.0, 80.0)).unwrap();
    host.insert_liquefiable(far, state.clone()).unwrap();
    let glass = host.add_node(None, NodeFrame::new(40.0, 40.0, 100.0, 100.0)).unwrap();
    host.insert_liquid(glass, state.clone(), |_, _| {}, full_renderer()).unwrap();
    host.frame();

    let near_layer = host
        .modifier::<LiquefiableNode>(near, 0)
        .unwrap()
        .liquefiable()
        .and_then(|l| l.layer(host.graph()));
    let own = host.modifier::<LiquidNode>(glass, 0).unwrap().layer().unwrap();

    let composite = host.layers().get(own).unwrap();
    let sampled: Vec<_> = composite
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::DrawLayer(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(sampled.len(), 1);
    assert_eq!(Some(sampled[0]), near_layer);
}
