use std::fmt::Write;

const BAR_WIDTH: usize = 40;

fn label_width(counts: &[(String, usize)]) -> usize {
  counts.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0)
}

/// Bar Chart
/// Horizontal bars scaled so the largest count fills the full width
pub fn bar_chart(title: &str, counts: &[(String, usize)]) -> String {
  let mut out: String = format!("{}\n", title);
  let max: usize = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
  let width: usize = label_width(counts);

  for (label, count) in counts {
    let bar_length: usize = if max == 0 { 0 } else { count * BAR_WIDTH / max };
    let _ = writeln!(out, "  {:<width$} {} ({})", label, "█".repeat(bar_length), count, width = width);
  }
  out
}

/// Share Chart
/// Each label's fraction of the total; `center` draws the donut variant with a caption
pub fn share_chart(title: &str, counts: &[(String, usize)], center: Option<&str>) -> String {
  let mut out: String = format!("{}\n", title);
  if let Some(caption) = center {
    let _ = writeln!(out, "  ( {} )", caption);
  }

  let total: usize = counts.iter().map(|(_, count)| *count).sum();
  let width: usize = label_width(counts);
  for (label, count) in counts {
    let share: f64 = if total == 0 { 0.0 } else { *count as f64 / total as f64 };
    let bar_length: usize = (share * BAR_WIDTH as f64).round() as usize;
    let _ = writeln!(
      out,
      "  {:<width$} {:>5.1}% {}",
      label,
      share * 100.0,
      "▒".repeat(bar_length),
      width = width
    );
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn counts() -> Vec<(String, usize)> {
    vec![("negatif".to_string(), 30), ("positif".to_string(), 15), ("netral".to_string(), 5)]
  }

  #[test]
  fn it_scales_bars_to_the_largest_count() {
    let chart: String = bar_chart("Distribusi", &counts());
    let lines: Vec<&str> = chart.lines().collect();
    assert_eq!(lines[0], "Distribusi");
    assert_eq!(lines[1].matches('█').count(), BAR_WIDTH);
    assert_eq!(lines[2].matches('█').count(), BAR_WIDTH / 2);
    assert!(lines[3].ends_with("(5)"));
  }

  #[test]
  fn it_prints_percentages() {
    let chart: String = share_chart("Pie", &counts(), None);
    assert!(chart.contains("negatif  60.0%"));
    assert!(chart.contains("netral   10.0%"));
  }

  #[test]
  fn it_draws_the_donut_caption() {
    let chart: String = share_chart("Donut", &counts(), Some("Sentimen"));
    assert_eq!(chart.lines().nth(1), Some("  ( Sentimen )"));
  }

  #[test]
  fn it_handles_empty_data() {
    assert_eq!(bar_chart("Kosong", &[]), "Kosong\n");
    assert_eq!(share_chart("Kosong", &[], None), "Kosong\n");
  }
}
