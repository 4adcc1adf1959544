/// WGSL source of the instanced mesh pipeline.
pub(super) const MESH_WGSL: &str = include_str!("shaders/mesh.wgsl");

pub(super) const VS_ENTRY: &str = "vs_main";
pub(super) const FS_ENTRY: &str = "fs_main";

pub(super) fn create_mesh_module(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("qd mesh shader"),
        source: wgpu::ShaderSource::Wgsl(MESH_WGSL.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> naga::Module {
        match naga::front::wgsl::parse_str(MESH_WGSL) {
            Ok(m) => m,
            Err(e) => panic!("{}", e.emit_to_string(MESH_WGSL)),
        }
    }

    #[test]
    fn validates() {
        let m = module();
        let mut v = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        );
        if let Err(e) = v.validate(&m) {
            panic!("{}", e.emit_to_string(MESH_WGSL));
        }
    }

    #[test]
    fn exposes_both_entry_points() {
        let m = module();
        let stages: Vec<(&str, naga::ShaderStage)> = m
            .entry_points
            .iter()
            .map(|ep| (ep.name.as_str(), ep.stage))
            .collect();
        assert!(stages.contains(&(VS_ENTRY, naga::ShaderStage::Vertex)));
        assert!(stages.contains(&(FS_ENTRY, naga::ShaderStage::Fragment)));
    }

    #[test]
    fn resource_bindings_match_layouts() {
        let m = module();
        let mut bindings: Vec<(u32, u32)> = m
            .global_variables
            .iter()
            .filter_map(|(_, gv)| gv.binding.as_ref().map(|b| (b.group, b.binding)))
            .collect();
        bindings.sort_unstable();
        assert_eq!(bindings, vec![(0, 0), (0, 1), (0, 2), (0, 3), (1, 0)]);
    }

    #[test]
    fn vertex_inputs_match_vtx_layout() {
        let m = module();
        let ep = m
            .entry_points
            .iter()
            .find(|ep| ep.name == VS_ENTRY)
            .expect("vertex entry point");

        let mut locations = Vec::new();
        for arg in &ep.function.arguments {
            if let naga::TypeInner::Struct { members, .. } = &m.types[arg.ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = member.binding {
                        locations.push(location);
                    }
                }
            }
        }
        locations.sort_unstable();
        assert_eq!(locations, vec![0, 1, 2, 3, 4]);
    }
}
