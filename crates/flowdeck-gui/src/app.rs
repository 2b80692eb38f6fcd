use std::path::Path;

use anyhow::Context;
use eframe::egui;
use flowdeck_core::{normalize_plan, sample_plan, NodeId, WorkflowPlan};
use flowdeck_graph::{EdgePatch, LayeredLayout, WorkflowGraph};

use crate::canvas::FlowCanvas;

/// Read and normalize a workflow plan from a JSON file.
pub fn load_plan(path: &Path) -> anyhow::Result<WorkflowPlan> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading workflow plan from {}", path.display()))?;
    let plan: WorkflowPlan = serde_json::from_str(&raw)
        .with_context(|| format!("parsing workflow plan {}", path.display()))?;
    Ok(normalize_plan(plan))
}

pub struct FlowdeckApp {
    graph: WorkflowGraph,
    layouter: LayeredLayout,
    canvas: FlowCanvas,
    summary: String,
    selected_node: Option<NodeId>,
    status: Option<String>,
    /// Buffer for the selected edge's label editor; flushed via the
    /// mutation API on change.
    edge_label_buffer: String,
    edge_label_for: Option<usize>,
}

impl FlowdeckApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, plan_path: Option<&str>) -> Self {
        let (plan, status) = match plan_path {
            Some(path) => match load_plan(Path::new(path)) {
                Ok(plan) => (plan, None),
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "falling back to sample plan");
                    (sample_plan(), Some(format!("{err:#}")))
                }
            },
            None => (sample_plan(), None),
        };
        let summary = plan.summary.clone();
        Self {
            graph: WorkflowGraph::from_plan(plan),
            layouter: LayeredLayout::default(),
            canvas: FlowCanvas::new(),
            summary,
            selected_node: None,
            status,
            edge_label_buffer: String::new(),
            edge_label_for: None,
        }
    }

    fn side_panel_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Workflow");
        if !self.summary.is_empty() {
            ui.label(egui::RichText::new(&self.summary).weak());
        }
        ui.separator();

        if let Some(id) = self.selected_node.clone() {
            ui.strong("Agent");
            ui.label(egui::RichText::new(id.as_str()).monospace().weak());
            if let Some(fields) = self.graph.node_display_mut(&id) {
                ui.label("Name");
                ui.text_edit_singleline(fields.name);
                ui.label("Role");
                ui.text_edit_singleline(fields.role);
                ui.label("Objective");
                ui.text_edit_multiline(fields.objective);
            }
            ui.add_space(8.0);
            if ui.button("Delete agent").clicked() {
                self.graph.delete_node(&id);
                self.selected_node = None;
            }
        } else if let Some(index) = self.canvas.selected_edge() {
            self.edge_panel_ui(ui, index);
        } else {
            ui.label(
                egui::RichText::new("Select an agent or a handoff to inspect it.").weak(),
            );
        }

        ui.separator();
        if ui.button("Auto layout").clicked() {
            self.graph.auto_layout();
        }
    }

    fn edge_panel_ui(&mut self, ui: &mut egui::Ui, index: usize) {
        let Some(edge) = self.graph.edges().get(index) else {
            return;
        };
        ui.strong("Handoff");
        ui.label(
            egui::RichText::new(format!("{} -> {}", edge.source, edge.target))
                .monospace()
                .weak(),
        );

        if self.edge_label_for != Some(index) {
            self.edge_label_for = Some(index);
            self.edge_label_buffer = edge.label.clone();
        }
        let contract = edge.handoff_contract.clone();

        ui.label("Label");
        if ui.text_edit_singleline(&mut self.edge_label_buffer).changed() {
            let patch = EdgePatch::relabel(self.edge_label_buffer.clone());
            if let Err(violation) = self.graph.update_edge(index, patch) {
                self.status = Some(violation.to_string());
            }
        }

        if let Some(contract) = contract {
            ui.add_space(8.0);
            ui.strong("Contract");
            ui.label(egui::RichText::new(&contract.packet_type).monospace());
            for field in &contract.fields {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&field.target_key).monospace());
                    ui.label(egui::RichText::new(&field.field_type).weak());
                    if !field.required {
                        ui.label(egui::RichText::new("optional").weak().italics());
                    }
                });
                if !field.description.is_empty() {
                    ui.label(egui::RichText::new(&field.description).weak().small());
                }
            }
        }

        ui.add_space(8.0);
        if ui.button("Delete handoff").clicked() {
            if let Err(violation) = self.graph.delete_edge(index) {
                self.status = Some(violation.to_string());
            }
            self.edge_label_for = None;
        }
    }
}

impl eframe::App for FlowdeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match &self.status {
                    Some(message) => {
                        ui.colored_label(ui.visuals().warn_fg_color, message);
                    }
                    None => {
                        ui.label(format!(
                            "{} agents, {} handoffs",
                            self.graph.nodes().len(),
                            self.graph.edges().len()
                        ));
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "zoom {:.0}%",
                            self.canvas.viewport().scale * 100.0
                        ))
                        .weak(),
                    );
                });
            });
        });

        egui::SidePanel::right("detail_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.side_panel_ui(ui);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let out = self.canvas.show(ui, &mut self.graph, &self.layouter);
                if let Some(violation) = out.violation {
                    self.status = Some(violation.to_string());
                }
                if let Some(id) = out.node_clicked {
                    self.selected_node = Some(id);
                    self.status = None;
                }
                if out.background_clicked {
                    self.selected_node = None;
                    self.status = None;
                }
                if self.canvas.selected_edge() != self.edge_label_for {
                    self.edge_label_for = None;
                }
            });
    }
}
