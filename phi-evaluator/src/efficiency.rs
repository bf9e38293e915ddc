/// Composite score rewarding both accuracy and frugality, for the (out-of-
/// core) prompt optimiser to rank candidate prompts by: `F1` dominates, with
/// two bonus terms worth up to 15% each for staying under a time budget
/// (`t_max`) and a prompt-length budget (`l_max`). Faster/shorter than the
/// budget caps the bonus at its full 0.15; slower/longer tapers it toward 0
/// without ever going negative.
pub fn efficiency_score(f1: f64, t_max: f64, t_measured: f64, l_max: f64, l_measured: f64) -> f64 {
    let time_bonus = 0.15 * ratio_capped(t_max, t_measured);
    let length_bonus = 0.15 * ratio_capped(l_max, l_measured);
    f1 * (0.7 + time_bonus + length_bonus)
}

fn ratio_capped(budget: f64, measured: f64) -> f64 {
    if measured <= 0.0 {
        return 1.0;
    }
    (budget / measured).min(1.0).max(0.0)
}
