//! Text rendering of circuits.
//!
//! One line per qubit, a spacer line between neighbouring qubits for
//! vertical connectors, and a single classical line at the bottom that
//! shows which bit a measurement writes or which pattern a conditional
//! gate reads. Barrier labels are printed on a header line.
//!
//! ```text
//!            Encode
//! q0: ─■──■──░──M───────
//!      │  │  ░  ║
//! q1: ─⊕──┼──░──╫──M────
//!         │  ░  ║  ║
//! q2: ────⊕──░──╫──╫──M─
//!                 ║  ║  ║
//! c:  ══════════0══1══2═
//! ```

use rustc_hash::FxHashMap;

use crate::circuit::Circuit;
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::QubitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Quantum,
    Spacer,
    Classical,
}

impl RowKind {
    fn fill(self) -> char {
        match self {
            RowKind::Quantum => '─',
            RowKind::Spacer => ' ',
            RowKind::Classical => '═',
        }
    }
}

#[derive(Debug, Default)]
struct Column {
    cells: FxHashMap<usize, String>,
    label: Option<String>,
}

impl Column {
    fn width(&self) -> usize {
        self.cells
            .values()
            .map(|c| c.chars().count())
            .max()
            .unwrap_or(1)
    }
}

/// Render `circuit` as text, one string per output line.
pub fn draw_lines(circuit: &Circuit) -> Vec<String> {
    TextDrawer::new(circuit).render()
}

/// Render `circuit` as a single multi-line string.
pub fn draw(circuit: &Circuit) -> String {
    draw_lines(circuit).join("\n")
}

struct TextDrawer {
    kinds: Vec<RowKind>,
    labels: Vec<String>,
    rows_by_qubit: FxHashMap<QubitId, usize>,
    classical_row: Option<usize>,
    columns: Vec<Column>,
    levels: Vec<usize>,
}

impl TextDrawer {
    fn new(circuit: &Circuit) -> Self {
        let mut kinds = Vec::new();
        let mut labels = Vec::new();
        let mut rows_by_qubit = FxHashMap::default();

        for (i, qubit) in circuit.qubits().iter().enumerate() {
            if i > 0 {
                kinds.push(RowKind::Spacer);
                labels.push(String::new());
            }
            rows_by_qubit.insert(qubit.id, kinds.len());
            kinds.push(RowKind::Quantum);
            labels.push(format!("{qubit}: "));
        }

        let classical_row = (circuit.num_clbits() > 0).then(|| {
            if !kinds.is_empty() {
                kinds.push(RowKind::Spacer);
                labels.push(String::new());
            }
            kinds.push(RowKind::Classical);
            labels.push("c: ".to_string());
            kinds.len() - 1
        });

        let mut drawer = Self {
            levels: vec![0; kinds.len()],
            kinds,
            labels,
            rows_by_qubit,
            classical_row,
            columns: Vec::new(),
        };

        for (_, inst) in circuit.dag().topological_ops() {
            drawer.add(inst);
        }
        drawer
    }

    fn add(&mut self, inst: &Instruction) {
        match &inst.kind {
            InstructionKind::Measure => {
                for (qubit, clbit) in inst.qubits.iter().zip(&inst.clbits) {
                    let mut marks = self.qubit_marks([(*qubit, "M".to_string())]);
                    if let Some(row) = self.classical_row {
                        marks.push((row, clbit.0.to_string()));
                    }
                    self.place(marks, false, None);
                }
            }
            InstructionKind::Reset => {
                let marks = self.qubit_marks(inst.qubits.iter().map(|q| (*q, "|0>".to_string())));
                self.place(marks, false, None);
            }
            InstructionKind::Barrier { label } => {
                let marks = self.qubit_marks(inst.qubits.iter().map(|q| (*q, "░".to_string())));
                self.place(marks, true, label.clone());
            }
            InstructionKind::Gate(gate) => {
                let controls = gate.kind.num_controls();
                let target = match gate.kind {
                    StandardGate::CX | StandardGate::CCX => "⊕",
                    other => other.symbol(),
                };
                let mut marks = self.qubit_marks(inst.qubits.iter().enumerate().map(|(i, q)| {
                    let text = if i < controls { "■" } else { target };
                    (*q, text.to_string())
                }));
                if let (Some(cond), Some(row)) = (&gate.condition, self.classical_row) {
                    let first = cond.clbits.first().map_or(0, |c| c.0);
                    let last = cond.clbits.last().map_or(0, |c| c.0);
                    let bits = if first == last {
                        format!("c{first}")
                    } else {
                        format!("c{first}-{last}")
                    };
                    marks.push((row, format!("{bits}={}", cond.pattern())));
                }
                self.place(marks, false, None);
            }
        }
    }

    fn qubit_marks(
        &self,
        marks: impl IntoIterator<Item = (QubitId, String)>,
    ) -> Vec<(usize, String)> {
        marks
            .into_iter()
            .filter_map(|(q, text)| self.rows_by_qubit.get(&q).map(|&row| (row, text)))
            .collect()
    }

    fn place(&mut self, marks: Vec<(usize, String)>, barrier: bool, label: Option<String>) {
        let Some(min) = marks.iter().map(|(r, _)| *r).min() else {
            return;
        };
        let max = marks.iter().map(|(r, _)| *r).max().unwrap_or(min);
        let lowest_quantum = marks
            .iter()
            .filter(|(r, _)| self.kinds[*r] == RowKind::Quantum)
            .map(|(r, _)| *r)
            .max()
            .unwrap_or(min);

        let col = (min..=max).map(|r| self.levels[r]).max().unwrap_or(0);
        while self.columns.len() <= col {
            self.columns.push(Column::default());
        }

        let column = &mut self.columns[col];
        for (row, text) in marks {
            column.cells.insert(row, text);
        }
        for row in min..=max {
            if column.cells.contains_key(&row) {
                continue;
            }
            let double = row > lowest_quantum;
            let connector = match (self.kinds[row], barrier, double) {
                (_, true, _) => "░",
                (RowKind::Quantum, false, false) => "┼",
                (RowKind::Quantum, false, true) => "╫",
                (_, false, false) => "│",
                (_, false, true) => "║",
            };
            column.cells.insert(row, connector.to_string());
        }
        if label.is_some() {
            column.label = label;
        }
        for row in min..=max {
            self.levels[row] = col + 1;
        }
    }

    fn render(&self) -> Vec<String> {
        let label_width = self
            .labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = self.columns.iter().map(Column::width).collect();

        let mut lines = Vec::with_capacity(self.kinds.len() + 1);

        if self.columns.iter().any(|c| c.label.is_some()) {
            let mut header = " ".repeat(label_width);
            let mut offset = label_width;
            for (column, width) in self.columns.iter().zip(&widths) {
                if let Some(label) = &column.label {
                    let pos = offset + 1 + (width - 1) / 2;
                    let len = header.chars().count();
                    if len < pos {
                        header.push_str(&" ".repeat(pos - len));
                    } else if len > label_width {
                        header.push(' ');
                    }
                    header.push_str(label);
                }
                offset += width + 2;
            }
            lines.push(header.trim_end().to_string());
        }

        for (row, kind) in self.kinds.iter().enumerate() {
            let fill = kind.fill();
            let mut line = format!("{:<label_width$}", self.labels[row]);
            for (column, &width) in self.columns.iter().zip(&widths) {
                let text = column.cells.get(&row).map_or("", String::as_str);
                let len = text.chars().count();
                let left = (width - len) / 2;
                let right = width - len - left;
                line.extend(std::iter::repeat_n(fill, left + 1));
                line.push_str(text);
                line.extend(std::iter::repeat_n(fill, right + 1));
            }
            lines.push(if *kind == RowKind::Spacer {
                line.trim_end().to_string()
            } else {
                line
            });
        }

        lines
    }
}
