//! Curated pattern libraries for entity and relationship extraction.
//!
//! All tables are immutable statics compiled once; matching is a pure
//! function of the input text.

use once_cell::sync::Lazy;
use regex::Regex;

use papergraph_core::{EntityType, RelationType};

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Well-known benchmark and corpus names.
pub static DATASET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(ImageNet|CIFAR[-\s]?\d+|MNIST|COCO|VOC\s?\d+|SQuAD|GLUE|SuperGLUE|WikiText|Penn\s?Treebank)\b",
        r"(?i)\b(WMT[-\s]?\d+|SNLI|MultiNLI|SST[-\s]?\d+|MRPC|QQP|QNLI|RTE|WNLI)\b",
        r"(?i)\b(MS[-\s]?COCO|Visual\s?Genome|Flickr\d+k?|LVIS|ADE\d+K?|Cityscapes)\b",
        r"(?i)\b(LibriSpeech|Common\s?Voice|AudioSet|VoxCeleb\d?)\b",
        r"(?i)\b(WebText|BookCorpus|C4|The\s?Pile|RedPajama|LAION[-\s]?\d+[BMK]?)\b",
    ])
});

/// Generic "<Capitalized phrase> dataset/benchmark/corpus" mentions. The
/// phrase itself is matched case-sensitively; the keyword is not.
pub static DATASET_GENERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][\w-]*(?:\s+[A-Z][\w-]*)*)\s+(?i:dataset|benchmark|corpus|corpora)\b")
        .unwrap()
});

pub static METRIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(accuracy|precision|recall|F1[-\s]?score|F[-\s]?measure|AUC[-\s]?ROC|mAP|IoU)\b",
        r"(?i)\b(BLEU[-\s]?\d*|ROUGE[-\s]?[LN12]*|METEOR|CIDEr|perplexity|PPL)\b",
        r"(?i)\b(top[-\s]?\d+\s+accuracy|mean\s+average\s+precision|average\s+precision)\b",
        r"(?i)\b(FID|IS|inception\s+score|Frechet\s+inception\s+distance)\b",
        r"(?i)\b(MSE|RMSE|MAE|PSNR|SSIM)\b",
        r"(?i)\b(WER|CER|word\s+error\s+rate|character\s+error\s+rate)\b",
        r"(?i)\b(EM|exact\s+match)\b",
    ])
});

pub static METHOD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(Transformer|BERT|GPT[-\s]?\d*|ResNet[-\s]?\d*|VGG[-\s]?\d*|LSTM|GRU|CNN|RNN)\b",
        r"(?i)\b(ViT|Vision\s+Transformer|DETR|YOLO(?:v\d)?|Faster\s+R[-\s]?CNN|Mask\s+R[-\s]?CNN)\b",
        r"(?i)\b(U[-\s]?Net|GAN|VAE|Diffusion\s+Model|Stable\s+Diffusion|DALL[-\s]?E)\b",
        r"(?i)\b(T5|BART|XLNet|RoBERTa|ALBERT|DeBERTa|ELECTRA|LLaMA|Mistral|Qwen)\b",
        r"(?i)\b(attention\s+mechanism|self[-\s]?attention|cross[-\s]?attention|multi[-\s]?head\s+attention)\b",
        r"(?i)\b(dropout|batch\s+normalization|layer\s+normalization|residual\s+connection)\b",
        r"(?i)\b(fine[-\s]?tuning|pre[-\s]?training|transfer\s+learning|few[-\s]?shot|zero[-\s]?shot)\b",
        r"(?i)\b(reinforcement\s+learning|supervised\s+learning|unsupervised\s+learning|self[-\s]?supervised)\b",
        r"(?i)\b(contrastive\s+learning|knowledge\s+distillation|data\s+augmentation)\b",
        r"(?i)\b(gradient\s+descent|Adam|SGD|AdamW)\b",
    ])
});

pub static TOOL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(PyTorch|TensorFlow|JAX|Keras|Hugging\s?Face|scikit[-\s]?learn|spaCy|NLTK)\b",
        r"(?i)\b(NumPy|SciPy|Pandas|OpenCV|CUDA|cuDNN)\b",
        r"(?i)\b(NVIDIA\s+[A-Z]\d+|TPU|A100|V100|H100)\b",
    ])
});

pub static THEORY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(Bayes(?:ian)?\s+(?:theorem|inference|optimization|network))\b",
        r"(?i)\b(Markov\s+(?:chain|decision\s+process|random\s+field))\b",
        r"(?i)\b(KL[-\s]?divergence|mutual\s+information|information\s+entropy)\b",
        r"(?i)\b(optimal\s+transport|Wasserstein\s+distance|variational\s+inference)\b",
    ])
});

/// Sentence patterns introducing the problem a paper works on.
pub static RESEARCH_PROBLEM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)(?:we\s+(?:address|tackle|study|investigate|focus\s+on|propose\s+a\s+solution\s+(?:to|for)))\s+(?:the\s+)?(?:problem\s+of\s+)?(.{10,80}?)(?:\.|,|\band\b)",
        r"(?i)(?:the\s+(?:problem|task|challenge)\s+of)\s+(.{10,80}?)(?:\.|,)",
        r"(?i)(?:this\s+(?:paper|work|study)\s+(?:addresses|tackles|focuses\s+on|investigates))\s+(.{10,80}?)(?:\.|,)",
    ])
});

/// Comparison phrasings that name baseline systems.
pub static BASELINE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)(?:compared?\s+(?:with|to|against)|baseline[s]?(?:\s+(?:include|are))?)[:\s]+(.{5,200}?)(?:\.|$)",
        r"(?i)(?:outperform[s]?|surpass(?:es)?|exceed[s]?)\s+(.{5,80}?)(?:\s+(?:by|on|in|with)\b|\.|,)",
    ])
});

/// Phrase templates per relation type; `{src}`/`{tgt}` are replaced with
/// escaped entity text before matching. Order matters: the first matching
/// relation wins.
pub static RELATION_INDICATORS: [(RelationType, &[&str]); 5] = [
    (
        RelationType::Uses,
        &[
            r"{src}\s+(?:uses?|utilizes?|employs?|leverages?|applies)\s+{tgt}",
            r"{tgt}\s+(?:is\s+)?(?:used|utilized|employed|applied)\s+(?:by|in|for)\s+{src}",
            r"(?:using|with|via|through)\s+{tgt}",
        ],
    ),
    (
        RelationType::EvaluatesOn,
        &[
            r"{src}\s+(?:on|evaluated?\s+on|tested?\s+on|benchmarked?\s+on)\s+{tgt}",
            r"(?:evaluate|test|benchmark)\s+{src}\s+on\s+{tgt}",
            r"(?:results?\s+on|performance\s+on)\s+{tgt}",
        ],
    ),
    (
        RelationType::Improves,
        &[
            r"{src}\s+(?:improves?|outperforms?|surpass(?:es)?|exceeds?|beats?)\s+{tgt}",
            r"{src}\s+(?:achieves?\s+(?:better|higher|superior)\s+(?:\w+\s+)?(?:than|over))\s+{tgt}",
        ],
    ),
    (
        RelationType::Comparative,
        &[
            r"{src}\s+(?:compared?\s+(?:to|with)|vs\.?|versus)\s+{tgt}",
            r"(?:comparison\s+(?:between|of))\s+{src}\s+and\s+{tgt}",
        ],
    ),
    (
        RelationType::PartOf,
        &[
            r"{src}\s+(?:component|module|layer|part)\s+of\s+{tgt}",
            r"{tgt}\s+(?:consists?\s+of|includes?|contains?)\s+{src}",
        ],
    ),
];

/// Relation implied by an ordered entity-type pair when two entities only
/// co-occur.
pub fn type_relation(source: EntityType, target: EntityType) -> Option<RelationType> {
    use EntityType::*;
    match (source, target) {
        (Method, Dataset) => Some(RelationType::EvaluatesOn),
        (Method, Metric) => Some(RelationType::EvaluatesOn),
        (Method, Tool) => Some(RelationType::Uses),
        (Method, Theory) => Some(RelationType::Uses),
        (Method, Baseline) => Some(RelationType::Comparative),
        (Innovation, Method) => Some(RelationType::Improves),
        (Innovation, Baseline) => Some(RelationType::Improves),
        (ResearchProblem, Method) => Some(RelationType::Causal),
        (ResearchProblem, Innovation) => Some(RelationType::Causal),
        _ => None,
    }
}
