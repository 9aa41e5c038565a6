//! Evaluation metrics for the held-out split: confusion matrix, per-class
//! precision/recall/F1, and an sklearn-style report table for the trainer's
//! stdout summary.

/// Row-major confusion matrix; `counts[truth * n_classes + predicted]`.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    n_classes: usize,
    counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        self.counts[truth * self.n_classes + predicted] += 1;
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// Per-class evaluation summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassReport {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u32,
}

/// Precision, recall, and F1 for every class. Classes with no predictions
/// (or no support) score zero rather than NaN.
pub fn per_class_report(cm: &ConfusionMatrix) -> Vec<ClassReport> {
    let k = cm.n_classes();
    let mut reports = Vec::with_capacity(k);
    for class in 0..k {
        let tp = cm.get(class, class) as f64;
        let mut predicted = 0.0;
        let mut actual = 0.0;
        for other in 0..k {
            predicted += cm.get(other, class) as f64;
            actual += cm.get(class, other) as f64;
        }
        let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
        let recall = if actual > 0.0 { tp / actual } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        reports.push(ClassReport {
            precision,
            recall,
            f1,
            support: actual as u32,
        });
    }
    reports
}

/// Fraction of correct predictions; zero for an empty matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let total = cm.total();
    if total == 0 {
        return 0.0;
    }
    let correct: u32 = (0..cm.n_classes()).map(|c| cm.get(c, c)).sum();
    correct as f64 / total as f64
}

/// Render the report table: one row per class, then accuracy, macro and
/// weighted averages.
pub fn render_report(cm: &ConfusionMatrix, class_names: &[String]) -> String {
    let reports = per_class_report(cm);
    let total = cm.total();
    let name_width = class_names
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(0)
        .max("weighted avg".len());

    let mut out = String::new();
    out.push_str(&format!(
        "{:>name_width$}  {:>9}  {:>9}  {:>9}  {:>9}\n\n",
        "", "precision", "recall", "f1-score", "support"
    ));
    for (name, report) in class_names.iter().zip(&reports) {
        out.push_str(&format!(
            "{:>name_width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}\n",
            name, report.precision, report.recall, report.f1, report.support
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "{:>name_width$}  {:>9}  {:>9}  {:>9.2}  {:>9}\n",
        "accuracy",
        "",
        "",
        accuracy(cm),
        total
    ));

    let k = reports.len().max(1) as f64;
    let macro_p = reports.iter().map(|r| r.precision).sum::<f64>() / k;
    let macro_r = reports.iter().map(|r| r.recall).sum::<f64>() / k;
    let macro_f = reports.iter().map(|r| r.f1).sum::<f64>() / k;
    out.push_str(&format!(
        "{:>name_width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}\n",
        "macro avg", macro_p, macro_r, macro_f, total
    ));

    if total > 0 {
        let weight = |f: fn(&ClassReport) -> f64| {
            reports
                .iter()
                .map(|r| f(r) * r.support as f64)
                .sum::<f64>()
                / total as f64
        };
        out.push_str(&format!(
            "{:>name_width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}\n",
            "weighted avg",
            weight(|r| r.precision),
            weight(|r| r.recall),
            weight(|r| r.f1),
            total
        ));
    }
    out
}
