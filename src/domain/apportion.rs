//! 删减字数分配
//!
//! 把整本书需要删减的字数按权重分摊到各章节:
//! - 权重 = 章节字数 × (1 + 优先级/100)
//! - 每章删减量不超过其字数的 max_chapter_reduction 比例
//! - 被封顶章节的剩余份额继续分给还有余量的章节
//! - 取整后的零头按权重从大到小逐字分配

/// 参与分配的章节
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChapterWeight {
    pub word_count: u32,
    pub priority_score: u8,
}

impl ChapterWeight {
    fn weight(&self) -> f64 {
        f64::from(self.word_count) * (1.0 + f64::from(self.priority_score) / 100.0)
    }

    fn cap(&self, max_chapter_reduction: f64) -> u32 {
        (f64::from(self.word_count) * max_chapter_reduction).floor() as u32
    }
}

/// 计算每章的删减字数，返回顺序与输入一致
///
/// 总和为 min(words_to_cut, Σ 每章上限)
pub fn apportion_cuts(
    chapters: &[ChapterWeight],
    words_to_cut: u32,
    max_chapter_reduction: f64,
) -> Vec<u32> {
    let ratio = max_chapter_reduction.clamp(0.0, 1.0);
    let caps: Vec<u32> = chapters.iter().map(|c| c.cap(ratio)).collect();
    let weights: Vec<f64> = chapters.iter().map(ChapterWeight::weight).collect();
    let mut cuts = vec![0_u32; chapters.len()];

    let total_cap: u64 = caps.iter().map(|&c| u64::from(c)).sum();
    let mut remaining = u64::from(words_to_cut).min(total_cap);

    while remaining > 0 {
        let open: Vec<usize> = (0..chapters.len()).filter(|&i| cuts[i] < caps[i]).collect();
        if open.is_empty() {
            break;
        }

        let total_weight: f64 = open.iter().map(|&i| weights[i]).sum();
        let mut assigned: u64 = 0;

        if total_weight > 0.0 {
            for &i in &open {
                let share = (remaining as f64 * weights[i] / total_weight).floor() as u64;
                let room = u64::from(caps[i] - cuts[i]);
                let add = share.min(room);
                cuts[i] += add as u32;
                assigned += add;
            }
        }

        // 份额全被取整吃掉时，逐字分配零头
        if assigned == 0 {
            let mut order = open;
            order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]).then(a.cmp(&b)));
            for i in order {
                if assigned == remaining {
                    break;
                }
                cuts[i] += 1;
                assigned += 1;
            }
        }

        remaining -= assigned;
    }

    cuts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(word_count: u32, priority_score: u8) -> ChapterWeight {
        ChapterWeight {
            word_count,
            priority_score,
        }
    }

    #[test]
    fn test_cuts_sum_to_words_to_cut() {
        let chapters = vec![chapter(30_000, 10), chapter(35_000, 10), chapter(30_000, 10)];
        let cuts = apportion_cuts(&chapters, 15_000, 0.5);
        assert_eq!(cuts.iter().sum::<u32>(), 15_000);
    }

    #[test]
    fn test_equal_priority_is_proportional_to_length() {
        let chapters = vec![chapter(10_000, 0), chapter(30_000, 0)];
        let cuts = apportion_cuts(&chapters, 4_000, 0.5);
        assert_eq!(cuts, vec![1_000, 3_000]);
    }

    #[test]
    fn test_higher_priority_gets_larger_share() {
        let chapters = vec![chapter(10_000, 0), chapter(10_000, 100)];
        let cuts = apportion_cuts(&chapters, 3_000, 0.5);
        assert!(cuts[1] > cuts[0]);
        assert_eq!(cuts.iter().sum::<u32>(), 3_000);
    }

    #[test]
    fn test_caps_redistribute_surplus() {
        let chapters = vec![chapter(1_000, 100), chapter(20_000, 0)];
        let cuts = apportion_cuts(&chapters, 5_000, 0.5);
        assert!(cuts[0] <= 500);
        assert_eq!(cuts.iter().sum::<u32>(), 5_000);
    }

    #[test]
    fn test_infeasible_cut_stops_at_caps() {
        let chapters = vec![chapter(1_000, 0), chapter(1_000, 0)];
        let cuts = apportion_cuts(&chapters, 10_000, 0.5);
        assert_eq!(cuts, vec![500, 500]);
    }

    #[test]
    fn test_remainder_goes_to_heaviest() {
        let chapters = vec![chapter(100, 0), chapter(100, 50), chapter(100, 0)];
        let cuts = apportion_cuts(&chapters, 1, 0.5);
        assert_eq!(cuts, vec![0, 1, 0]);
    }

    #[test]
    fn test_nothing_to_cut() {
        let chapters = vec![chapter(5_000, 40)];
        assert_eq!(apportion_cuts(&chapters, 0, 0.5), vec![0]);
        assert!(apportion_cuts(&[], 100, 0.5).is_empty());
    }
}
